use crate::config::{FunderProfile, QuestionnaireConfig};
use crate::domain::events::{ContentEvent, IntegrationValue, ReplyValue};
use crate::domain::model::{Contact, InputRow, ProjectMetadata};

/// Values that end up in the questionnaire for one row.
pub struct ContentFields<'a> {
    pub row: &'a InputRow,
    pub contact: &'a Contact,
    pub metadata: &'a ProjectMetadata,
    pub funder: &'a FunderProfile,
}

/// Builds the ordered reply events followed by the phase event.
pub fn build_content_events(
    questionnaire: &QuestionnaireConfig,
    fields: &ContentFields<'_>,
) -> Vec<ContentEvent> {
    let indication = questionnaire.phases_answered();
    let reply = |path: &str, value: ReplyValue| ContentEvent::reply(path, value, indication);
    let text = |value: &str| ReplyValue::StringReply(value.to_string());

    let mut events = vec![
        reply(
            &questionnaire.start_path,
            ReplyValue::ItemListReply(vec![questionnaire.contributor_uuid.clone()]),
        ),
        reply(&questionnaire.name_path, text(&fields.row.display_name())),
        reply(&questionnaire.email_path, text(&fields.contact.email)),
    ];

    if let Some(orcid) = &fields.row.orcid {
        events.push(reply(&questionnaire.orcid_path, text(orcid)));
    }

    events.extend([
        reply(
            &questionnaire.affiliation_path,
            ReplyValue::AnswerReply(questionnaire.affiliation_choice.clone()),
        ),
        reply(
            &questionnaire.role_path,
            ReplyValue::AnswerReply(questionnaire.role_choice.clone()),
        ),
        reply(
            &questionnaire.project_path,
            ReplyValue::ItemListReply(vec![questionnaire.project_item_uuid.clone()]),
        ),
        reply(&questionnaire.project_name_path, text(&fields.metadata.title_en)),
        reply(
            &questionnaire.project_description_path,
            text(&fields.metadata.description_en),
        ),
        reply(&questionnaire.project_start_path, text(&fields.metadata.start_date)),
        reply(&questionnaire.project_end_path, text(&fields.metadata.end_date)),
        reply(
            &questionnaire.funding_path,
            ReplyValue::ItemListReply(vec![questionnaire.funding_item_uuid.clone()]),
        ),
        reply(
            &questionnaire.funder_path,
            ReplyValue::IntegrationReply(IntegrationValue::IntegrationType {
                value: fields.funder.name.clone(),
                id: fields.funder.dsw_funder_id.clone(),
            }),
        ),
        reply(
            &questionnaire.status_path,
            ReplyValue::AnswerReply(questionnaire.status_choice_granted.clone()),
        ),
        reply(&questionnaire.grant_id_path, text(&fields.row.grant_id)),
    ]);

    events.push(ContentEvent::phase(&questionnaire.phase_uuid, indication));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::model::Funder;

    fn fixture(orcid: Option<&str>) -> (AppConfig, InputRow, Contact, ProjectMetadata) {
        let config = AppConfig::from_toml_str(crate::config::tests::SAMPLE_CONFIG).unwrap();
        let row = InputRow {
            line: 1,
            grant_id: "2021-05377".to_string(),
            person_name: "Olsson Louise".to_string(),
            email: "louise.olsson@chalmers.se".to_string(),
            orcid: orcid.map(str::to_string),
            funder: None,
        };
        let contact = Contact {
            email: "louise.olsson@chalmers.se".to_string(),
            identifier: None,
        };
        let metadata = ProjectMetadata::new(
            "Yeast cell factories",
            "Jästcellfabriker",
            "About yeast",
            "Om jäst",
            "2022-01-01 00:00:00.000",
            "2025-12-31 00:00:00.000",
        );
        (config, row, contact, metadata)
    }

    #[test]
    fn test_event_order_and_phase_last() {
        let (config, row, contact, metadata) = fixture(Some("0000-0002-8308-0784"));
        let profile = config.funder_profile(Funder::Vr).unwrap();
        let events = build_content_events(
            &config.questionnaire,
            &ContentFields {
                row: &row,
                contact: &contact,
                metadata: &metadata,
                funder: profile,
            },
        );

        let paths: Vec<Option<&str>> = events.iter().map(|e| e.path()).collect();
        assert_eq!(events.len(), 16);
        assert_eq!(paths[0], Some("start"));
        assert_eq!(paths[3], Some("start.contributor-1.orcid"));
        assert_eq!(paths[14], Some("project.funding.grant"));
        assert!(matches!(events.last(), Some(ContentEvent::SetPhaseEvent { .. })));
    }

    #[test]
    fn test_orcid_is_omitted_when_absent_and_dates_are_short() {
        let (config, row, contact, metadata) = fixture(None);
        let profile = config.funder_profile(Funder::Vr).unwrap();
        let events = build_content_events(
            &config.questionnaire,
            &ContentFields {
                row: &row,
                contact: &contact,
                metadata: &metadata,
                funder: profile,
            },
        );

        assert_eq!(events.len(), 15);
        assert!(events.iter().all(|e| e.path() != Some("start.contributor-1.orcid")));

        let start = events
            .iter()
            .find(|e| e.path() == Some("project.start"))
            .and_then(|e| e.value())
            .unwrap();
        assert_eq!(start, &ReplyValue::StringReply("2022-01-01".to_string()));

        let funder = events
            .iter()
            .find(|e| e.path() == Some("project.funding.funder"))
            .and_then(|e| e.value())
            .unwrap();
        assert_eq!(
            funder,
            &ReplyValue::IntegrationReply(IntegrationValue::IntegrationType {
                value: "Swedish Research Council".to_string(),
                id: "501100004359".to_string(),
            })
        );
    }
}
