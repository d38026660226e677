use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasesAnsweredIndication {
    pub answered_questions: u32,
    pub unanswered_questions: u32,
    indication_type: &'static str,
}

impl PhasesAnsweredIndication {
    pub fn new(answered_questions: u32, unanswered_questions: u32) -> Self {
        Self {
            answered_questions,
            unanswered_questions,
            indication_type: "PhasesAnsweredIndication",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum IntegrationValue {
    IntegrationType { value: String, id: String },
}

/// Typed reply values accepted by the questionnaire content endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ReplyValue {
    StringReply(String),
    AnswerReply(String),
    ItemListReply(Vec<String>),
    IntegrationReply(IntegrationValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ContentEvent {
    #[serde(rename_all = "camelCase")]
    SetReplyEvent {
        uuid: Uuid,
        path: String,
        value: ReplyValue,
        phases_answered_indication: PhasesAnsweredIndication,
    },
    #[serde(rename_all = "camelCase")]
    SetPhaseEvent {
        uuid: Uuid,
        phase_uuid: String,
        phases_answered_indication: PhasesAnsweredIndication,
    },
}

impl ContentEvent {
    pub fn reply(path: &str, value: ReplyValue, indication: PhasesAnsweredIndication) -> Self {
        ContentEvent::SetReplyEvent {
            uuid: Uuid::new_v4(),
            path: path.to_string(),
            value,
            phases_answered_indication: indication,
        }
    }

    pub fn phase(phase_uuid: &str, indication: PhasesAnsweredIndication) -> Self {
        ContentEvent::SetPhaseEvent {
            uuid: Uuid::new_v4(),
            phase_uuid: phase_uuid.to_string(),
            phases_answered_indication: indication,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            ContentEvent::SetReplyEvent { path, .. } => Some(path),
            ContentEvent::SetPhaseEvent { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&ReplyValue> {
        match self {
            ContentEvent::SetReplyEvent { value, .. } => Some(value),
            ContentEvent::SetPhaseEvent { .. } => None,
        }
    }
}
