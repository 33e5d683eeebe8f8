use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Session-scoped flag suppressing the completion prompt after one showing.
pub const COMPLETION_PROMPT_FLAG: &str = "profile-completion-prompt";

/// Candidate verification record as submitted by the candidate dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationRecord {
    pub cv_url: Option<String>,
    pub headline: Option<String>,
    pub skills: Vec<String>,
    pub expected_salary: Option<u64>,
}

/// Optional full profile; when present its sections join the mandatory list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub about: Option<String>,
    pub work_history: Vec<String>,
    pub education: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub filled: usize,
    pub total: usize,
    pub percentage: u8,
    pub missing: Vec<&'static str>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Evaluate the fixed, ordered mandatory checks: strings must be non-empty,
/// collections non-empty, numbers positive where semantically required.
/// `missing` preserves declaration order.
pub fn assess(
    record: &VerificationRecord,
    profile: Option<&CandidateProfile>,
) -> CompletenessReport {
    let mut checks: Vec<(&'static str, bool)> = vec![
        ("CV/Resume Document", present(&record.cv_url)),
        ("Professional Headline", present(&record.headline)),
        ("Skills", !record.skills.is_empty()),
        (
            "Expected Salary",
            record.expected_salary.is_some_and(|n| n > 0),
        ),
    ];

    if let Some(profile) = profile {
        checks.push(("About/Summary", present(&profile.about)));
        checks.push(("Work History", !profile.work_history.is_empty()));
        checks.push(("Education", !profile.education.is_empty()));
    }

    let total = checks.len();
    let filled = checks.iter().filter(|(_, ok)| *ok).count();
    let missing = checks
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(label, _)| *label)
        .collect();
    let percentage = ((filled as f64 / total as f64) * 100.0).round() as u8;

    CompletenessReport {
        filled,
        total,
        percentage,
        missing,
    }
}

/// Whether the completion prompt should show: only for incomplete profiles,
/// and at most once per session.
pub fn completion_prompt_due(session: &Session, report: &CompletenessReport) -> bool {
    report.percentage < 100 && !session.is_dismissed(COMPLETION_PROMPT_FLAG)
}

pub fn dismiss_completion_prompt(session: &Session) {
    session.dismiss(COMPLETION_PROMPT_FLAG);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CurrentUser, Role};
    use uuid::Uuid;

    fn complete_record() -> VerificationRecord {
        VerificationRecord {
            cv_url: Some("https://cdn.talentgrid.local/cv/1.pdf".into()),
            headline: Some("Backend engineer".into()),
            skills: vec!["rust".into(), "sql".into()],
            expected_salary: Some(85_000),
        }
    }

    #[test]
    fn missing_cv_scores_seventy_five_percent() {
        let record = VerificationRecord {
            cv_url: None,
            ..complete_record()
        };

        let report = assess(&record, None);
        assert_eq!(report.total, 4);
        assert_eq!(report.filled, 3);
        assert_eq!(report.percentage, 75);
        assert_eq!(report.missing, vec!["CV/Resume Document"]);
    }

    #[test]
    fn missing_list_preserves_declaration_order() {
        let record = VerificationRecord {
            cv_url: None,
            headline: Some("  ".into()),
            skills: vec![],
            expected_salary: Some(0),
        };

        let report = assess(&record, None);
        assert_eq!(report.filled, 0);
        assert_eq!(report.percentage, 0);
        assert_eq!(
            report.missing,
            vec![
                "CV/Resume Document",
                "Professional Headline",
                "Skills",
                "Expected Salary"
            ]
        );
    }

    #[test]
    fn full_profile_extends_the_mandatory_list() {
        let profile = CandidateProfile {
            about: Some("Ten years of backend work.".into()),
            work_history: vec!["Acme Corp".into()],
            education: vec![],
        };

        let report = assess(&complete_record(), Some(&profile));
        assert_eq!(report.total, 7);
        assert_eq!(report.filled, 6);
        assert_eq!(report.percentage, 86);
        assert_eq!(report.missing, vec!["Education"]);
    }

    #[test]
    fn counts_always_reconcile_and_stay_in_range() {
        let records = [
            VerificationRecord::default(),
            complete_record(),
            VerificationRecord {
                skills: vec!["rust".into()],
                ..Default::default()
            },
        ];
        let profiles = [None, Some(CandidateProfile::default())];

        for record in &records {
            for profile in &profiles {
                let report = assess(record, profile.as_ref());
                assert!(report.percentage <= 100);
                assert_eq!(report.missing.len() + report.filled, report.total);
            }
        }
    }

    #[test]
    fn complete_record_scores_one_hundred() {
        let report = assess(&complete_record(), None);
        assert_eq!(report.percentage, 100);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn prompt_shows_once_per_session_for_incomplete_profiles() {
        let session = Session::new(CurrentUser {
            id: Uuid::new_v4(),
            email: "candidate@talentgrid.local".into(),
            role: Role::Candidate,
        });
        let incomplete = assess(&VerificationRecord::default(), None);

        assert!(completion_prompt_due(&session, &incomplete));
        dismiss_completion_prompt(&session);
        assert!(!completion_prompt_due(&session, &incomplete));

        let complete = assess(&complete_record(), None);
        assert!(!completion_prompt_due(&session, &complete));
    }
}
