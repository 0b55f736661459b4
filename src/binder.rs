//! Resolves the placeholders of a [`Template`] against one logical parameter.

use crate::error::{BindingError, Error};
use crate::params::{Param, Params};
use crate::template::{Placeholder, Template};
use crate::value::Value;

/// The value bound to one placeholder.
///
/// `IN` placeholders always carry a list, others always a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Single(Value),
    List(Vec<Value>),
}

/// Binds `params` to the placeholders of `template`.
///
/// The result is parallel to [`Template::placeholders`]. A `None` entry is a
/// placeholder that received no value, which [`build_query`](crate::builder::build_query)
/// reports as [`BindingError::UnboundPlaceholder`].
///
/// Date and time values are stored in their canonical text form.
///
/// # Errors
///
/// Returns [`Error::Binding`] for a missing map key, a missing or unexported
/// record field, or a list bound to a placeholder that does not follow `IN`.
pub fn bind(template: &Template, params: &Params<'_>) -> crate::Result<Vec<Option<BoundValue>>> {
    let placeholders: Vec<&Placeholder> = template.placeholders().collect();
    let fail = |kind: BindingError| Error::binding(template.source(), kind);

    match params {
        Params::None => Ok(vec![None; placeholders.len()]),
        Params::Value(value) => placeholders
            .iter()
            .map(|p| resolve(p, Param::Value(value.clone())).map(Some).map_err(fail))
            .collect(),
        Params::Seq(items) => {
            if let [only] = placeholders.as_slice() {
                if only.in_context {
                    let mut values = Vec::new();
                    for item in items {
                        match item {
                            Param::Value(v) => values.push(v.clone().into_canonical()),
                            Param::List(vs) => {
                                values.extend(vs.iter().cloned().map(Value::into_canonical))
                            }
                        }
                    }
                    return Ok(vec![Some(BoundValue::List(values))]);
                }
            }
            let mut bound = vec![None; placeholders.len()];
            for (slot, (p, item)) in bound.iter_mut().zip(placeholders.iter().zip(items)) {
                *slot = Some(resolve(p, item.clone()).map_err(fail)?);
            }
            Ok(bound)
        }
        Params::Map(map) => placeholders
            .iter()
            .map(|p| {
                let param = map
                    .get(&p.name)
                    .ok_or_else(|| BindingError::MissingKey(p.name.clone()))
                    .map_err(fail)?;
                resolve(p, param.clone()).map(Some).map_err(fail)
            })
            .collect(),
        Params::Record(record) => placeholders
            .iter()
            .map(|p| {
                if !p.name.starts_with(|c: char| c.is_ascii_uppercase()) {
                    return Err(fail(BindingError::UnexportedField(p.name.clone())));
                }
                let param = record
                    .param(&p.name)
                    .ok_or_else(|| fail(BindingError::MissingField(p.name.clone())))?;
                resolve(p, param).map(Some).map_err(fail)
            })
            .collect(),
    }
}

fn resolve(placeholder: &Placeholder, param: Param) -> Result<BoundValue, BindingError> {
    match (placeholder.in_context, param) {
        (true, Param::Value(v)) => Ok(BoundValue::List(vec![v.into_canonical()])),
        (true, Param::List(vs)) => Ok(BoundValue::List(
            vs.into_iter().map(Value::into_canonical).collect(),
        )),
        (false, Param::Value(v)) => Ok(BoundValue::Single(v.into_canonical())),
        (false, Param::List(_)) => Err(BindingError::ListOutsideIn(placeholder.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ToParams;
    use chrono::NaiveDate;

    struct Person {
        name: String,
        age: i64,
        ids: Vec<i64>,
    }

    impl ToParams for Person {
        fn param(&self, name: &str) -> Option<Param> {
            match name {
                "Name" => Some(Param::from(self.name.clone())),
                "Age" => Some(Param::from(self.age)),
                "Ids" => Some(Param::list(self.ids.iter().copied())),
                "secret" => Some(Param::from("hidden")),
                _ => None,
            }
        }
    }

    fn single(v: impl Into<Value>) -> Option<BoundValue> {
        Some(BoundValue::Single(v.into()))
    }

    #[test]
    fn test_scalar_binds_every_placeholder() {
        let template = Template::parse("SELECT * FROM t WHERE a = #{a} OR b = #{b}").unwrap();
        let bound = bind(&template, &Params::from(7)).unwrap();
        assert_eq!(bound, vec![single(7), single(7)]);
    }

    #[test]
    fn test_sequence_flattens_into_single_in_placeholder() {
        let template = Template::parse("SELECT * FROM t WHERE ids IN #{ids}").unwrap();
        let bound = bind(&template, &Params::list([1, 2, 3])).unwrap();
        assert_eq!(
            bound,
            vec![Some(BoundValue::List(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ]))]
        );
    }

    #[test]
    fn test_sequence_binds_positionally() {
        let template =
            Template::parse("SELECT * FROM t WHERE id IN #{ids} AND name = #{name}").unwrap();
        let bound = bind(&template, &crate::params![Param::list([1, 2, 3]), "John"]).unwrap();
        assert_eq!(
            bound,
            vec![
                Some(BoundValue::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])),
                single("John"),
            ]
        );
    }

    #[test]
    fn test_sequence_leaves_excess_placeholders_unbound() {
        let template = Template::parse("#{a} #{b} #{c}").unwrap();
        let bound = bind(&template, &crate::params![1, 2]).unwrap();
        assert_eq!(bound, vec![single(1), single(2), None]);
    }

    #[test]
    fn test_map_missing_key_names_the_key() {
        let template = Template::parse("SELECT * FROM t WHERE name = #{name} AND age = #{age}").unwrap();
        let params = Params::map([("name", "Bob")]);
        let err = bind(&template, &params).unwrap_err();
        match err {
            Error::Binding { kind, sql } => {
                assert_eq!(kind, BindingError::MissingKey("age".into()));
                assert_eq!(sql, template.source());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_record_binds_by_field_name() {
        let person = Person {
            name: "Alice".into(),
            age: 30,
            ids: vec![1, 2],
        };
        let template =
            Template::parse("SELECT * FROM t WHERE age = #{Age} AND name = #{Name} AND id IN #{Ids}")
                .unwrap();
        let bound = bind(&template, &Params::record(&person)).unwrap();
        assert_eq!(
            bound,
            vec![
                single(30i64),
                single("Alice"),
                Some(BoundValue::List(vec![Value::Int(1), Value::Int(2)])),
            ]
        );
    }

    #[test]
    fn test_record_rejects_unexported_and_missing_fields() {
        let person = Person {
            name: "Alice".into(),
            age: 30,
            ids: vec![],
        };
        let template = Template::parse("SELECT #{secret}").unwrap();
        let err = bind(&template, &Params::record(&person)).unwrap_err();
        assert!(matches!(
            err,
            Error::Binding { kind: BindingError::UnexportedField(ref f), .. } if f == "secret"
        ));

        let template = Template::parse("SELECT #{Email}").unwrap();
        let err = bind(&template, &Params::record(&person)).unwrap_err();
        assert!(matches!(
            err,
            Error::Binding { kind: BindingError::MissingField(ref f), .. } if f == "Email"
        ));
    }

    #[test]
    fn test_list_outside_in_is_rejected() {
        let template = Template::parse("SELECT * FROM t WHERE id = #{ids} AND x = #{x}").unwrap();
        let err = bind(&template, &crate::params![Param::list([1, 2]), 1]).unwrap_err();
        assert!(matches!(
            err,
            Error::Binding { kind: BindingError::ListOutsideIn(ref f), .. } if f == "ids"
        ));
    }

    #[test]
    fn test_dates_are_formatted() {
        let at = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(8, 0, 1)
            .unwrap();
        let template = Template::parse("UPDATE t SET at = #{at}").unwrap();
        let bound = bind(&template, &Params::from(at)).unwrap();
        assert_eq!(bound, vec![single("2024-02-29 08:00:01")]);
    }

    #[test]
    fn test_scalar_into_in_placeholder_is_a_one_element_list() {
        let template = Template::parse("SELECT * FROM t WHERE id IN #{id} AND x = #{x}").unwrap();
        let bound = bind(&template, &Params::from(9)).unwrap();
        assert_eq!(
            bound,
            vec![Some(BoundValue::List(vec![Value::Int(9)])), single(9)]
        );
    }
}
