//! `bureau_structure`: single lead slots → lists of leads.
//!
//! Legacy shape, per division:
//!
//! ```text
//! { division, division_lead, title: {line_1, line_2},
//!   division_lead_1, title_1: {line_1, line_2},
//!   link_to_division_page: {url},
//!   offices: [{ office_name, lead, title: {line_1, line_2} }] }
//! ```
//!
//! becomes
//!
//! ```text
//! { name, leads: [{name, title}], offices: [{name, leads: [{name, title}]}],
//!   overview_page }
//! ```
//!
//! `office_of_the_director` entries take the office shape plus one more level
//! of `offices`. Every other key of the block is left as it is.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{Migration, MigrationError, StreamFieldTarget};

pub const BLOCK_TYPE: &str = "bureau_structure";

/// Both keys must be present; either may be `null` or empty.
#[derive(Debug, Deserialize)]
struct TitleLines {
    #[serde(deserialize_with = "nullable")]
    line_1: Option<String>,
    #[serde(deserialize_with = "nullable")]
    line_2: Option<String>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

impl TitleLines {
    /// Non-empty lines joined with `\n`.
    fn joined(&self) -> String {
        [self.line_1.as_deref(), self.line_2.as_deref()]
            .into_iter()
            .flatten()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct DivisionLink {
    url: String,
}

/// Legacy office; director offices carry their nested `offices` alongside,
/// which are split off before parsing.
#[derive(Debug, Deserialize)]
struct LegacyOffice {
    office_name: String,
    lead: String,
    title: TitleLines,
}

/// Legacy division, minus its `offices` list.
#[derive(Debug, Deserialize)]
struct LegacyDivision {
    division: String,
    #[serde(default)]
    division_lead: Option<String>,
    #[serde(default)]
    title: Option<TitleLines>,
    #[serde(default)]
    division_lead_1: Option<String>,
    #[serde(default)]
    title_1: Option<TitleLines>,
    link_to_division_page: DivisionLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    pub name: String,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub name: String,
    pub leads: Vec<Lead>,
    pub offices: Vec<Office>,
    pub overview_page: String,
}

/// An office of the director: an office that may hold one level of offices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorOffice {
    pub name: String,
    pub leads: Vec<Lead>,
    pub offices: Vec<Office>,
}

impl From<LegacyOffice> for Office {
    fn from(office: LegacyOffice) -> Self {
        Office {
            leads: vec![Lead {
                name: office.lead,
                title: office.title.joined(),
            }],
            name: office.office_name,
        }
    }
}

impl LegacyDivision {
    fn migrate(self, offices: Vec<Office>, path: &str) -> Result<Division, MigrationError> {
        let slots = [
            ("division_lead", self.division_lead, self.title),
            ("division_lead_1", self.division_lead_1, self.title_1),
        ];
        let mut leads = Vec::new();
        for (slot, name, title) in slots {
            let Some(name) = name.filter(|n| !n.is_empty()) else {
                continue;
            };
            let title = title.ok_or_else(|| {
                structure(
                    format!("{path}.{slot}"),
                    format!("lead `{name}` has no title"),
                )
            })?;
            leads.push(Lead {
                name,
                title: title.joined(),
            });
        }

        Ok(Division {
            name: self.division,
            leads,
            offices,
            overview_page: self.link_to_division_page.url,
        })
    }
}

fn structure(path: String, reason: impl ToString) -> MigrationError {
    MigrationError::Structure {
        block: BLOCK_TYPE.to_string(),
        path,
        reason: reason.to_string(),
    }
}

fn parse_at<T: DeserializeOwned>(value: Value, path: &str) -> Result<T, MigrationError> {
    serde_json::from_value(value).map_err(|e| structure(path.to_string(), e))
}

/// Take `record[key]` as a list of raw items tagged with their path; `None`
/// when there is nothing to migrate (key absent or `null`).
fn legacy_items(
    record: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<(String, Value)>>, MigrationError> {
    let items = match record.get_mut(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => std::mem::take(items),
        Some(other) => {
            return Err(structure(
                key.to_string(),
                format!("expected a list, found {}", type_name(other)),
            ))
        }
    };

    let tagged = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| (format!("{key}[{i}]"), item))
        .collect();
    Ok(Some(tagged))
}

/// Split the nested `offices` list off an item so the rest can be parsed on
/// its own. An absent or `null` list is an error only when `required`.
fn take_offices(
    item: &mut Value,
    path: &str,
    required: bool,
) -> Result<Vec<Value>, MigrationError> {
    let fields = match item {
        Value::Object(fields) => fields,
        other => {
            return Err(structure(
                path.to_string(),
                format!("expected an object, found {}", type_name(other)),
            ))
        }
    };
    match fields.remove("offices") {
        Some(Value::Array(offices)) => Ok(offices),
        None | Some(Value::Null) if !required => Ok(Vec::new()),
        None => Err(structure(path.to_string(), "missing field `offices`")),
        Some(other) => Err(structure(
            format!("{path}.offices"),
            format!("expected a list, found {}", type_name(&other)),
        )),
    }
}

fn migrate_offices(offices: Vec<Value>, path: &str) -> Result<Vec<Office>, MigrationError> {
    offices
        .into_iter()
        .enumerate()
        .map(|(i, office)| {
            parse_at::<LegacyOffice>(office, &format!("{path}.offices[{i}]")).map(Office::from)
        })
        .collect()
}

fn migrate_division(mut item: Value, path: &str) -> Result<Division, MigrationError> {
    let offices = take_offices(&mut item, path, true)?;
    let division: LegacyDivision = parse_at(item, path)?;
    let offices = migrate_offices(offices, path)?;
    division.migrate(offices, path)
}

fn migrate_director_office(mut item: Value, path: &str) -> Result<DirectorOffice, MigrationError> {
    let offices = take_offices(&mut item, path, false)?;
    let Office { name, leads } = parse_at::<LegacyOffice>(item, path)?.into();
    Ok(DirectorOffice {
        name,
        leads,
        offices: migrate_offices(offices, path)?,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Reshape one legacy `bureau_structure` value.
///
/// Works on a copy, so an error never leaves a half-migrated record behind.
pub fn migrate_bureau_structure(value: Value) -> Result<Value, MigrationError> {
    let mut record = match value {
        Value::Object(record) => record,
        other => {
            return Err(structure(
                "<root>".to_string(),
                format!("expected an object, found {}", type_name(&other)),
            ))
        }
    };

    if let Some(divisions) = legacy_items(&mut record, "divisions")? {
        let migrated = divisions
            .into_iter()
            .map(|(path, item)| migrate_division(item, &path))
            .collect::<Result<Vec<_>, _>>()?;
        record.insert("divisions".into(), to_value(&migrated)?);
    }

    if let Some(offices) = legacy_items(&mut record, "office_of_the_director")? {
        let migrated = offices
            .into_iter()
            .map(|(path, item)| migrate_director_office(item, &path))
            .collect::<Result<Vec<_>, _>>()?;
        record.insert("office_of_the_director".into(), to_value(&migrated)?);
    }

    Ok(Value::Object(record))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, MigrationError> {
    serde_json::to_value(value).map_err(|e| structure("<root>".to_string(), e))
}

/// `0205_bureau_structure_multiple_leads`: forward-only.
pub struct BureauStructureMultipleLeads;

impl BureauStructureMultipleLeads {
    pub const NAME: &'static str = "0205_bureau_structure_multiple_leads";
    const TARGETS: &'static [StreamFieldTarget] = &[StreamFieldTarget {
        page_type: "BrowsePage",
        field: "content",
        block_type: BLOCK_TYPE,
    }];
}

impl Migration for BureauStructureMultipleLeads {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn targets(&self) -> &[StreamFieldTarget] {
        Self::TARGETS
    }

    fn forward(&self, value: Value) -> Result<Value, MigrationError> {
        migrate_bureau_structure(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead_title(line_1: &str, line_2: &str) -> String {
        let value = json!({
            "director": "Rohit",
            "divisions": [{
                "division": "Ops",
                "division_lead": "Jane",
                "title": {"line_1": line_1, "line_2": line_2},
                "link_to_division_page": {"url": "/ops"},
                "offices": []
            }]
        });
        let migrated = migrate_bureau_structure(value).unwrap();
        migrated["divisions"][0]["leads"][0]["title"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn title_lines_join_without_blank_lines() {
        assert_eq!(lead_title("A", ""), "A");
        assert_eq!(lead_title("", "B"), "B");
        assert_eq!(lead_title("", ""), "");
        assert_eq!(lead_title("A", "B"), "A\nB");
    }

    #[test]
    fn division_with_one_office() {
        let value = json!({
            "director": "Rohit",
            "divisions": [{
                "division": "Ops",
                "division_lead": "Jane",
                "title": {"line_1": "Dir", "line_2": ""},
                "division_lead_1": "",
                "title_1": {"line_1": "", "line_2": ""},
                "offices": [{
                    "office_name": "HR",
                    "lead": "Sam",
                    "title": {"line_1": "Mgr", "line_2": ""}
                }],
                "link_to_division_page": {"url": "/ops"}
            }]
        });

        let migrated = migrate_bureau_structure(value).unwrap();
        assert_eq!(
            migrated["divisions"],
            json!([{
                "name": "Ops",
                "leads": [{"name": "Jane", "title": "Dir"}],
                "offices": [{"name": "HR", "leads": [{"name": "Sam", "title": "Mgr"}]}],
                "overview_page": "/ops"
            }])
        );
        assert_eq!(migrated["director"], json!("Rohit"));
        assert!(migrated.get("office_of_the_director").is_none());
    }

    #[test]
    fn second_lead_slot_is_appended_and_empty_slots_skipped() {
        let value = json!({
            "divisions": [{
                "division": "Research",
                "title": {"line_1": "unused", "line_2": ""},
                "division_lead_1": "Ann",
                "title_1": {"line_1": "Associate Director", "line_2": "Research"},
                "link_to_division_page": {"url": "/research"},
                "offices": []
            }, {
                "division": "Legal",
                "division_lead": "Bo",
                "title": {"line_1": "General Counsel", "line_2": ""},
                "division_lead_1": "Cy",
                "title_1": {"line_1": "", "line_2": "Deputy"},
                "link_to_division_page": {"url": "/legal"},
                "offices": []
            }]
        });

        let migrated = migrate_bureau_structure(value).unwrap();
        let divisions: Vec<Division> =
            serde_json::from_value(migrated["divisions"].clone()).unwrap();
        assert_eq!(
            divisions[0].leads,
            vec![Lead {
                name: "Ann".into(),
                title: "Associate Director\nResearch".into()
            }]
        );
        assert_eq!(
            divisions[1].leads,
            vec![
                Lead {
                    name: "Bo".into(),
                    title: "General Counsel".into()
                },
                Lead {
                    name: "Cy".into(),
                    title: "Deputy".into()
                },
            ]
        );
    }

    #[test]
    fn office_of_the_director_nests_one_level() {
        let value = json!({
            "director": "Rohit",
            "last_updated_date": "2019-01-01",
            "download_image": 12,
            "office_of_the_director": [{
                "office_name": "Front Office",
                "lead": "Pat",
                "title": {"line_1": "Chief of Staff", "line_2": ""},
                "offices": [{
                    "office_name": "Policy",
                    "lead": "Lee",
                    "title": {"line_1": "", "line_2": "Policy Associate"}
                }]
            }, {
                "office_name": "Ombudsman",
                "lead": "Kim",
                "title": {"line_1": "Ombudsman", "line_2": ""}
            }]
        });

        let migrated = migrate_bureau_structure(value).unwrap();
        assert_eq!(
            migrated,
            json!({
                "director": "Rohit",
                "last_updated_date": "2019-01-01",
                "download_image": 12,
                "office_of_the_director": [{
                    "name": "Front Office",
                    "leads": [{"name": "Pat", "title": "Chief of Staff"}],
                    "offices": [{
                        "name": "Policy",
                        "leads": [{"name": "Lee", "title": "Policy Associate"}]
                    }]
                }, {
                    "name": "Ombudsman",
                    "leads": [{"name": "Kim", "title": "Ombudsman"}],
                    "offices": []
                }]
            })
        );
        assert!(migrated.get("divisions").is_none());
    }

    #[test]
    fn empty_lists_stay_empty() {
        let value = json!({"director": "Rohit", "divisions": [], "office_of_the_director": []});
        assert_eq!(migrate_bureau_structure(value.clone()).unwrap(), value);
    }

    #[test]
    fn office_without_name_is_reported_at_its_own_path() {
        let value = json!({
            "divisions": [{
                "division": "Ops",
                "link_to_division_page": {"url": "/ops"},
                "offices": [
                    {"office_name": "HR", "lead": "Sam", "title": {"line_1": "Mgr", "line_2": ""}},
                    {"lead": "Lou", "title": {"line_1": "Mgr", "line_2": ""}}
                ]
            }]
        });

        match migrate_bureau_structure(value).unwrap_err() {
            MigrationError::Structure { path, reason, .. } => {
                assert_eq!(path, "divisions[0].offices[1]");
                assert!(reason.contains("office_name"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_director_office_errors_carry_the_inner_index() {
        let value = json!({
            "office_of_the_director": [{
                "office_name": "Front Office",
                "lead": "Pat",
                "title": {"line_1": "Chief of Staff", "line_2": ""},
                "offices": [{"office_name": "Policy", "title": {"line_1": "", "line_2": ""}}]
            }]
        });

        let err = migrate_bureau_structure(value).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Structure { ref path, ref reason, .. }
                if path == "office_of_the_director[0].offices[0]" && reason.contains("lead")
        ));
    }

    #[test]
    fn title_lines_must_both_be_present() {
        let value = json!({
            "divisions": [{
                "division": "Ops",
                "division_lead": "Jane",
                "title": {"line_1": "Dir"},
                "link_to_division_page": {"url": "/ops"},
                "offices": []
            }]
        });
        let err = migrate_bureau_structure(value).unwrap_err();
        assert!(err.to_string().contains("line_2"), "{err}");

        let nulls = json!({
            "office_of_the_director": [{
                "office_name": "Ombudsman",
                "lead": "Kim",
                "title": {"line_1": null, "line_2": "Ombudsman"}
            }]
        });
        let migrated = migrate_bureau_structure(nulls).unwrap();
        assert_eq!(
            migrated["office_of_the_director"][0]["leads"][0]["title"],
            json!("Ombudsman")
        );
    }

    #[test]
    fn division_without_offices_is_a_structure_error() {
        let value = json!({
            "divisions": [{
                "division": "Ops",
                "link_to_division_page": {"url": "/ops"}
            }]
        });
        let err = migrate_bureau_structure(value).unwrap_err();
        assert_eq!(
            err,
            MigrationError::Structure {
                block: BLOCK_TYPE.into(),
                path: "divisions[0]".into(),
                reason: "missing field `offices`".into(),
            }
        );
    }

    #[test]
    fn lead_without_title_is_a_structure_error() {
        let value = json!({
            "divisions": [{
                "division": "Ops",
                "division_lead": "Jane",
                "link_to_division_page": {"url": "/ops"},
                "offices": []
            }]
        });

        let err = migrate_bureau_structure(value).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Structure { ref path, .. } if path == "divisions[0].division_lead"
        ));
    }

    #[test]
    fn already_migrated_records_are_rejected() {
        let value = json!({
            "divisions": [{
                "name": "Ops",
                "leads": [{"name": "Jane", "title": "Dir"}],
                "offices": [],
                "overview_page": "/ops"
            }]
        });
        assert!(matches!(
            migrate_bureau_structure(value),
            Err(MigrationError::Structure { .. })
        ));

        let value = json!({"office_of_the_director": [{"name": "Front Office", "leads": []}]});
        assert!(migrate_bureau_structure(value).is_err());
    }

    #[test]
    fn non_list_divisions_are_rejected() {
        let err = migrate_bureau_structure(json!({"divisions": {"division": "Ops"}})).unwrap_err();
        assert!(err.to_string().contains("expected a list"));
        assert!(migrate_bureau_structure(json!("bureau")).is_err());
    }

    #[test]
    fn backward_is_irreversible() {
        let err = BureauStructureMultipleLeads
            .backward(json!({"director": "Rohit"}))
            .unwrap_err();
        assert_eq!(
            err,
            MigrationError::Irreversible(BureauStructureMultipleLeads::NAME.to_string())
        );
    }
}
