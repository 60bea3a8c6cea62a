//! Field tag parsing.
//!
//! Every mapped field carries one tag string made of space-separated clauses:
//!
//! - `pk:<name>[,hash][,auto_inc]` — primary-key column, in declaration order;
//! - `table:<name>` — owning table, allowed once, on a primary-key field;
//! - `col:<name>[,atomic]` — plain attribute column;
//! - `prefix:<prefix>[,atomic]` — string-keyed map expanded into
//!   `<prefix><key>` columns.
//!
//! An empty tag marks a field the mapper ignores entirely.

use crate::error::{Error, Result};

/// The role a tagged field plays in the row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Pk { hash: bool, auto_inc: bool },
    Col { atomic: bool },
    Prefix { atomic: bool },
}

/// Parsed metadata for one mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Logical column name, or the column-name prefix for `Role::Prefix`.
    pub column: String,
    /// Owning table name; set on exactly one primary-key field per record.
    pub table: Option<String>,
    pub role: Role,
}

impl FieldSpec {
    pub fn is_pk(&self) -> bool {
        matches!(self.role, Role::Pk { .. })
    }

    pub fn is_hash_pk(&self) -> bool {
        matches!(self.role, Role::Pk { hash: true, .. })
    }

    pub fn is_auto_inc_pk(&self) -> bool {
        matches!(self.role, Role::Pk { auto_inc: true, .. })
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self.role, Role::Prefix { .. })
    }

    pub fn is_atomic(&self) -> bool {
        matches!(
            self.role,
            Role::Col { atomic: true } | Role::Prefix { atomic: true }
        )
    }
}

/// Parses a single field tag. Returns `None` for an empty tag (the field is
/// not mapped). Unknown clause families and modifiers fail fast.
pub fn parse(tag: &str) -> Result<Option<FieldSpec>> {
    let mut role = None;
    let mut column = None;
    let mut table = None;

    for clause in tag.split_whitespace() {
        let (family, rest) = clause
            .split_once(':')
            .ok_or_else(|| Error::Tag(format!("malformed clause `{clause}`")))?;
        match family {
            "table" => {
                if rest.is_empty() {
                    return Err(Error::Tag("empty table name".to_string()));
                }
                if table.replace(rest.to_string()).is_some() {
                    return Err(Error::Tag("duplicate table clause".to_string()));
                }
            }
            "pk" | "col" | "prefix" => {
                if role.is_some() {
                    return Err(Error::Tag(format!(
                        "field declares more than one role, second is `{family}`"
                    )));
                }
                let (name, modifiers) = split_name(rest)?;
                column = Some(name);
                role = Some(parse_role(family, &modifiers)?);
            }
            other => {
                return Err(Error::Tag(format!("unknown clause family `{other}`")));
            }
        }
    }

    match (role, column) {
        (Some(role), Some(column)) => {
            if table.is_some() && !matches!(role, Role::Pk { .. }) {
                return Err(Error::Tag(
                    "table clause is only allowed on a primary-key field".to_string(),
                ));
            }
            Ok(Some(FieldSpec {
                column,
                table,
                role,
            }))
        }
        (None, _) if table.is_some() => Err(Error::Tag(
            "table clause without a primary-key clause".to_string(),
        )),
        _ => Ok(None),
    }
}

fn split_name(rest: &str) -> Result<(String, Vec<&str>)> {
    let mut parts = rest.split(',');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(Error::Tag("empty column name".to_string()));
    }
    Ok((name.to_string(), parts.collect()))
}

fn parse_role(family: &str, modifiers: &[&str]) -> Result<Role> {
    let mut hash = false;
    let mut auto_inc = false;
    let mut atomic = false;
    for modifier in modifiers {
        match (*modifier, family) {
            ("hash", "pk") => hash = true,
            ("auto_inc", "pk") => auto_inc = true,
            ("atomic", "col") | ("atomic", "prefix") => atomic = true,
            (other, _) => {
                return Err(Error::Tag(format!(
                    "modifier `{other}` is not valid for `{family}`"
                )));
            }
        }
    }
    if hash && auto_inc {
        return Err(Error::Tag(
            "`hash` and `auto_inc` are mutually exclusive".to_string(),
        ));
    }
    Ok(match family {
        "pk" => Role::Pk { hash, auto_inc },
        "col" => Role::Col { atomic },
        _ => Role::Prefix { atomic },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pk_with_table_and_hash() {
        let spec = parse("pk:p1,hash table:orders").unwrap().unwrap();
        assert_eq!(spec.column, "p1");
        assert_eq!(spec.table.as_deref(), Some("orders"));
        assert_eq!(
            spec.role,
            Role::Pk {
                hash: true,
                auto_inc: false
            }
        );
    }

    #[test]
    fn test_parse_auto_inc_pk() {
        let spec = parse("pk:seq,auto_inc").unwrap().unwrap();
        assert!(spec.is_auto_inc_pk());
        assert!(!spec.is_hash_pk());
        assert!(spec.table.is_none());
    }

    #[test]
    fn test_parse_atomic_column() {
        let spec = parse("col:counter,atomic").unwrap().unwrap();
        assert_eq!(spec.column, "counter");
        assert!(spec.is_atomic());
        assert!(!spec.is_pk());
    }

    #[test]
    fn test_parse_prefix_column() {
        let spec = parse("prefix:c_").unwrap().unwrap();
        assert_eq!(spec.column, "c_");
        assert!(spec.is_prefix());
        assert!(!spec.is_atomic());
    }

    #[test]
    fn test_empty_tag_is_unmapped() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_unknown_family_fails() {
        assert!(matches!(parse("pkk:p1"), Err(Error::Tag(_))));
    }

    #[test]
    fn test_unknown_modifier_fails() {
        assert!(matches!(parse("col:c,increment"), Err(Error::Tag(_))));
        assert!(matches!(parse("pk:p,atomic"), Err(Error::Tag(_))));
    }

    #[test]
    fn test_hash_auto_inc_exclusive() {
        assert!(matches!(parse("pk:p,hash,auto_inc"), Err(Error::Tag(_))));
    }

    #[test]
    fn test_two_roles_fail() {
        assert!(matches!(parse("pk:p col:c"), Err(Error::Tag(_))));
    }

    #[test]
    fn test_table_on_plain_column_fails() {
        assert!(matches!(parse("col:c table:t"), Err(Error::Tag(_))));
        assert!(matches!(parse("table:t"), Err(Error::Tag(_))));
    }

    #[test]
    fn test_empty_column_name_fails() {
        assert!(matches!(parse("pk:"), Err(Error::Tag(_))));
        assert!(matches!(parse("col:,atomic"), Err(Error::Tag(_))));
    }
}
