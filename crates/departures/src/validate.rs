//! Form validation and duplicate detection.
//!
//! Raw form input is turned into a [`DepartureDraft`] by [`validate`], which
//! reports every problem at once instead of stopping at the first one.

use chrono::NaiveDate;
use tracing::debug;

use crate::departure::{parse_time, Departure, DepartureDraft, TransportKind};

/// A form field, used to name missing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Service date.
    ServiceDate,
    /// Unit number.
    UnitNumber,
    /// Gate.
    Gate,
    /// Departure time.
    DepartureTime,
    /// Transport kind.
    Transport,
    /// Destination.
    Destination,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ServiceDate => "service date",
            Self::UnitNumber => "unit number",
            Self::Gate => "gate",
            Self::DepartureTime => "departure time",
            Self::Transport => "transport type",
            Self::Destination => "destination",
        };
        f.write_str(name)
    }
}

/// A single reason a form was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required field was empty.
    Missing(Field),
    /// The gate contained something other than digits.
    GateNotNumeric(String),
    /// The gate is digits only but too large to store as a number.
    GateTooLarge(String),
    /// The time could not be read as `HH:MM`.
    InvalidTime(String),
    /// The transport kind is not one of the known kinds.
    UnknownTransport(String),
    /// The destination is not in the configured list.
    UnknownDestination(String),
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "{field} is required"),
            Self::GateNotNumeric(gate) => write!(f, "gate must be numeric: '{gate}'"),
            Self::GateTooLarge(gate) => write!(f, "gate number is too large: '{gate}'"),
            Self::InvalidTime(time) => write!(f, "invalid time: '{time}'"),
            Self::UnknownTransport(kind) => write!(f, "unknown transport type: '{kind}'"),
            Self::UnknownDestination(dest) => write!(f, "unknown destination: '{dest}'"),
        }
    }
}

/// All issues found in one submission. Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    /// Wrap a list of issues.
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self(issues)
    }

    /// The individual issues.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    /// Check whether a specific issue was reported.
    #[must_use]
    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.0.contains(issue)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Rules that vary between deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Reject gates that are not digits only.
    pub numeric_gate: bool,
    /// Treat an empty destination as missing.
    pub require_destination: bool,
    /// The closed list of destinations.
    pub destinations: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            numeric_gate: true,
            require_destination: false,
            destinations: crate::config::default_destinations(),
        }
    }
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartureForm {
    /// Service date as `YYYY-MM-DD`.
    pub service_date: String,
    /// Unit number.
    pub unit_number: String,
    /// Gate label.
    pub gate: String,
    /// Departure time.
    pub departure_time: String,
    /// Transport kind.
    pub transport: String,
    /// Destination (may be empty).
    pub destination: String,
    /// Comment (may be empty).
    pub comment: String,
}

impl DepartureForm {
    /// A form prefilled with a stored record, as the edit form starts out.
    #[must_use]
    pub fn from_departure(departure: &Departure) -> Self {
        Self {
            service_date: departure.service_date.to_string(),
            unit_number: departure.unit_number.clone(),
            gate: departure.gate.clone(),
            departure_time: departure.time_label(),
            transport: departure.transport.to_string(),
            destination: departure.destination.clone().unwrap_or_default(),
            comment: departure.comment.clone().unwrap_or_default(),
        }
    }
}

/// Validate and normalize a submitted form.
///
/// # Errors
///
/// Returns every [`ValidationIssue`] found when the form is not acceptable.
pub fn validate(
    form: &DepartureForm,
    rules: &ValidationRules,
) -> Result<DepartureDraft, ValidationErrors> {
    let mut issues = Vec::new();

    let service_date = match form.service_date.trim() {
        "" => {
            issues.push(ValidationIssue::Missing(Field::ServiceDate));
            None
        }
        raw => match NaiveDate::parse_from_str(raw, crate::departure::DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                issues.push(ValidationIssue::Missing(Field::ServiceDate));
                None
            }
        },
    };

    let unit_number = form.unit_number.trim();
    if unit_number.is_empty() {
        issues.push(ValidationIssue::Missing(Field::UnitNumber));
    }

    let gate = normalize_gate(form.gate.trim(), rules.numeric_gate, &mut issues);

    let departure_time = match form.departure_time.trim() {
        "" => {
            issues.push(ValidationIssue::Missing(Field::DepartureTime));
            None
        }
        raw => {
            let parsed = parse_time(raw);
            if parsed.is_none() {
                issues.push(ValidationIssue::InvalidTime(raw.to_string()));
            }
            parsed
        }
    };

    let transport = match form.transport.trim() {
        "" => {
            issues.push(ValidationIssue::Missing(Field::Transport));
            None
        }
        raw => {
            let parsed = raw.parse::<TransportKind>().ok();
            if parsed.is_none() {
                issues.push(ValidationIssue::UnknownTransport(raw.to_string()));
            }
            parsed
        }
    };

    let destination = match form.destination.trim() {
        "" => {
            if rules.require_destination {
                issues.push(ValidationIssue::Missing(Field::Destination));
            }
            None
        }
        raw => match rules
            .destinations
            .iter()
            .find(|known| known.eq_ignore_ascii_case(raw))
        {
            Some(known) => Some(known.clone()),
            None => {
                issues.push(ValidationIssue::UnknownDestination(raw.to_string()));
                None
            }
        },
    };

    let comment = Some(form.comment.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    match (service_date, gate, departure_time, transport) {
        (Some(service_date), Some(gate), Some(departure_time), Some(transport))
            if issues.is_empty() =>
        {
            Ok(DepartureDraft {
                service_date,
                unit_number: unit_number.to_string(),
                gate,
                departure_time,
                transport,
                destination,
                comment,
            })
        }
        _ => {
            debug!("Rejected departure form with {} issue(s)", issues.len());
            Err(ValidationErrors(issues))
        }
    }
}

/// Trim the gate and, when numeric gates are enforced, reduce it to its integer form.
fn normalize_gate(
    gate: &str,
    numeric_only: bool,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    if gate.is_empty() {
        issues.push(ValidationIssue::Missing(Field::Gate));
        return None;
    }
    if !is_numeric_gate(gate) {
        if numeric_only {
            issues.push(ValidationIssue::GateNotNumeric(gate.to_string()));
            return None;
        }
        return Some(gate.to_string());
    }
    match gate.parse::<i64>() {
        Ok(number) => Some(number.to_string()),
        Err(_) => {
            issues.push(ValidationIssue::GateTooLarge(gate.to_string()));
            None
        }
    }
}

/// Check whether a gate label consists of ASCII digits only.
#[must_use]
pub fn is_numeric_gate(gate: &str) -> bool {
    !gate.is_empty() && gate.chars().all(|c| c.is_ascii_digit())
}

/// Find a record that collides with `draft` on the duplicate triple.
///
/// Only records on the draft's service date are considered. The record with
/// `exclude_id` (the one being edited) never counts as a collision.
#[must_use]
pub fn find_duplicate<'a>(
    draft: &DepartureDraft,
    existing: &'a [Departure],
    exclude_id: Option<i64>,
) -> Option<&'a Departure> {
    existing.iter().find(|other| {
        (exclude_id.is_none() || other.id != exclude_id)
            && other.service_date == draft.service_date
            && other.unit_number == draft.unit_number
            && other.departure_time == draft.departure_time
            && other.destination_key() == draft.destination_key()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn form() -> DepartureForm {
        DepartureForm {
            service_date: "2024-05-01".to_string(),
            unit_number: "AB12".to_string(),
            gate: "3".to_string(),
            departure_time: "08:05".to_string(),
            transport: "Train".to_string(),
            destination: "Molde".to_string(),
            comment: String::new(),
        }
    }

    fn rules() -> ValidationRules {
        ValidationRules::default()
    }

    #[test]
    fn test_valid_form() {
        let draft = validate(&form(), &rules()).unwrap();
        assert_eq!(draft.unit_number, "AB12");
        assert_eq!(draft.gate, "3");
        assert_eq!(
            draft.departure_time,
            NaiveTime::from_hms_opt(8, 5, 0).unwrap()
        );
        assert_eq!(draft.transport, TransportKind::Train);
        assert_eq!(draft.destination.as_deref(), Some("Molde"));
        assert!(draft.comment.is_none());
    }

    #[test]
    fn test_trims_and_normalizes() {
        let mut f = form();
        f.unit_number = "  AB12 ".to_string();
        f.gate = "007".to_string();
        f.departure_time = "8:05".to_string();
        f.destination = "molde".to_string();
        f.comment = "  late  ".to_string();

        let draft = validate(&f, &rules()).unwrap();
        assert_eq!(draft.unit_number, "AB12");
        assert_eq!(draft.gate, "7");
        assert_eq!(draft.destination.as_deref(), Some("Molde"));
        assert_eq!(draft.comment.as_deref(), Some("late"));
    }

    #[test]
    fn test_all_missing_fields_reported() {
        let f = DepartureForm {
            service_date: "2024-05-01".to_string(),
            ..DepartureForm::default()
        };
        let errors = validate(&f, &rules()).unwrap_err();
        assert!(errors.contains(&ValidationIssue::Missing(Field::UnitNumber)));
        assert!(errors.contains(&ValidationIssue::Missing(Field::Gate)));
        assert!(errors.contains(&ValidationIssue::Missing(Field::DepartureTime)));
        assert!(errors.contains(&ValidationIssue::Missing(Field::Transport)));
        assert_eq!(errors.issues().len(), 4);
    }

    #[test]
    fn test_gate_with_non_digit_rejected() {
        for gate in ["3A", "A", "1 2", "-1", "3.5", "٣"] {
            let mut f = form();
            f.gate = gate.to_string();
            let errors = validate(&f, &rules()).unwrap_err();
            assert!(
                errors.contains(&ValidationIssue::GateNotNumeric(gate.trim().to_string())),
                "gate {gate:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_numeric_gates_accepted() {
        for gate in ["0", "1", "12", "0042", "99999"] {
            let mut f = form();
            f.gate = gate.to_string();
            assert!(validate(&f, &rules()).is_ok(), "gate {gate:?} should pass");
        }
    }

    #[test]
    fn test_gate_beyond_i64_rejected() {
        let huge = "99999999999999999999";
        for numeric_gate in [true, false] {
            let mut r = rules();
            r.numeric_gate = numeric_gate;
            let mut f = form();
            f.gate = huge.to_string();
            let errors = validate(&f, &r).unwrap_err();
            assert_eq!(
                errors.issues(),
                &[ValidationIssue::GateTooLarge(huge.to_string())]
            );
        }

        let mut f = form();
        f.gate = "09223372036854775807".to_string();
        assert_eq!(
            validate(&f, &rules()).unwrap().gate,
            i64::MAX.to_string()
        );
    }

    #[test]
    fn test_free_text_gate_when_not_enforced() {
        let mut r = rules();
        r.numeric_gate = false;
        let mut f = form();
        f.gate = "B4".to_string();
        assert_eq!(validate(&f, &r).unwrap().gate, "B4");
    }

    #[test]
    fn test_invalid_time() {
        let mut f = form();
        f.departure_time = "25:00".to_string();
        let errors = validate(&f, &rules()).unwrap_err();
        assert_eq!(
            errors.issues(),
            &[ValidationIssue::InvalidTime("25:00".to_string())]
        );
    }

    #[test]
    fn test_unknown_transport() {
        let mut f = form();
        f.transport = "Boat".to_string();
        let errors = validate(&f, &rules()).unwrap_err();
        assert!(errors.contains(&ValidationIssue::UnknownTransport("Boat".to_string())));
    }

    #[test]
    fn test_unknown_destination() {
        let mut f = form();
        f.destination = "Atlantis".to_string();
        let errors = validate(&f, &rules()).unwrap_err();
        assert!(errors.contains(&ValidationIssue::UnknownDestination(
            "Atlantis".to_string()
        )));
    }

    #[test]
    fn test_empty_destination_allowed_unless_required() {
        let mut f = form();
        f.destination = String::new();
        assert!(validate(&f, &rules()).unwrap().destination.is_none());

        let mut r = rules();
        r.require_destination = true;
        let errors = validate(&f, &r).unwrap_err();
        assert!(errors.contains(&ValidationIssue::Missing(Field::Destination)));
    }

    #[test]
    fn test_bad_service_date() {
        let mut f = form();
        f.service_date = "01.05.2024".to_string();
        let errors = validate(&f, &rules()).unwrap_err();
        assert!(errors.contains(&ValidationIssue::Missing(Field::ServiceDate)));
    }

    #[test]
    fn test_form_from_departure_round_trips() {
        let draft = validate(&form(), &rules()).unwrap();
        let stored = Departure::from_draft(1, draft.clone(), Utc::now());
        let again = validate(&DepartureForm::from_departure(&stored), &rules()).unwrap();
        assert_eq!(again, draft);
    }

    #[test]
    fn test_errors_display_joins_issues() {
        let errors = ValidationErrors::new(vec![
            ValidationIssue::Missing(Field::Gate),
            ValidationIssue::InvalidTime("x".to_string()),
        ]);
        assert_eq!(errors.to_string(), "gate is required; invalid time: 'x'");
    }

    #[test]
    fn test_find_duplicate_same_day() {
        let draft = validate(&form(), &rules()).unwrap();
        let existing = vec![Departure::from_draft(1, draft.clone(), Utc::now())];
        assert_eq!(
            find_duplicate(&draft, &existing, None).and_then(|d| d.id),
            Some(1)
        );
    }

    #[test]
    fn test_find_duplicate_ignores_self_and_other_days() {
        let draft = validate(&form(), &rules()).unwrap();
        let existing = vec![Departure::from_draft(1, draft.clone(), Utc::now())];
        assert!(find_duplicate(&draft, &existing, Some(1)).is_none());

        let mut next_day = draft.clone();
        next_day.service_date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert!(find_duplicate(&next_day, &existing, None).is_none());
    }

    #[test]
    fn test_find_duplicate_ignores_gate_and_kind() {
        let draft = validate(&form(), &rules()).unwrap();
        let existing = vec![Departure::from_draft(1, draft.clone(), Utc::now())];
        let mut other = draft;
        other.gate = "9".to_string();
        other.transport = TransportKind::Car;
        assert!(find_duplicate(&other, &existing, None).is_some());
    }
}
