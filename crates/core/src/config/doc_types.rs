//! Legacy doc-type lists.
//!
//! Older deployments configure document types as two comma lists on the
//! pipeline: `doc_types_list = "invoice,receipt"` and
//! `sqs_max_queues = "invoice_3,receipt_1"`. They are folded into the keyed
//! `[doc_types]` map at load time.

use std::collections::BTreeMap;

use tracing::warn;

use super::{types::Config, ConfigError};

/// Build a doc-type map from the legacy pair of comma lists.
///
/// Hints are matched to doc types by the text before their last `_`, not by
/// position. Hints for unlisted doc types are ignored.
pub fn parse_doc_type_hints(
    doc_types: &str,
    hints: &str,
) -> Result<BTreeMap<String, u32>, ConfigError> {
    let mut by_key = BTreeMap::new();
    for hint in split_list(hints) {
        let (key, count) = hint
            .rsplit_once('_')
            .ok_or_else(|| ConfigError::ParseError(format!("hint without count: {}", hint)))?;
        let count: u32 = count
            .parse()
            .map_err(|_| ConfigError::ParseError(format!("invalid count in hint: {}", hint)))?;
        by_key.insert(key.to_string(), count);
    }

    split_list(doc_types)
        .map(|doc_type| {
            by_key
                .get(doc_type)
                .map(|count| (doc_type.to_string(), *count))
                .ok_or_else(|| ConfigError::ParseError(format!("no hint for {}", doc_type)))
        })
        .collect()
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Fill `[doc_types]` from the legacy pipeline lists when the map is empty.
///
/// Both lists must be present together. A non-empty `[doc_types]` wins.
pub(crate) fn apply_legacy_doc_types(config: &mut Config) -> Result<(), ConfigError> {
    let pipeline = &config.pipeline;
    let (list, hints) = match (&pipeline.doc_types_list, &pipeline.sqs_max_queues) {
        (None, None) => return Ok(()),
        (Some(list), Some(hints)) => (list, hints),
        _ => {
            return Err(ConfigError::ParseError(
                "pipeline.doc_types_list and pipeline.sqs_max_queues must be set together"
                    .to_string(),
            ))
        }
    };

    if !config.doc_types.is_empty() {
        warn!("Ignoring pipeline.doc_types_list: [doc_types] is set");
        return Ok(());
    }

    config.doc_types = parse_doc_type_hints(list, hints)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    const LEGACY_TOML: &str = r#"
[pipeline]
country_code = "AR"
prefix = "pfx"
doc_types_list = "receipt, invoice"
sqs_max_queues = "zz_9,invoice_3,receipt_1"

[targets]
dispatch = "get-payments-ar"
error_report = "get-errors"
create_queues = "create-queues"
enqueue = "enqueue"
delete_queues = "delete-queues"
create_provisional = "create-provisional-operational"
to_provisional = "to-provisional-operational"
on_error = "to-error"
"#;

    #[test]
    fn test_parse_doc_type_hints_pairs_by_key() {
        // sorted independently these two lists would misalign
        let hints = parse_doc_type_hints("receipt, invoice", "zz_9,invoice_3,receipt_1").unwrap();
        assert_eq!(hints.get("invoice"), Some(&3));
        assert_eq!(hints.get("receipt"), Some(&1));
        assert_eq!(hints.len(), 2);
    }

    #[test]
    fn test_parse_doc_type_hints_requires_hint() {
        let err = parse_doc_type_hints("invoice,receipt", "invoice_3").unwrap_err();
        assert!(err.to_string().contains("no hint for receipt"));

        assert!(parse_doc_type_hints("invoice", "invoice_x").is_err());
        assert!(parse_doc_type_hints("invoice", "invoice").is_err());
    }

    #[test]
    fn test_legacy_lists_fill_doc_types() {
        let config = load_config_from_str(LEGACY_TOML).unwrap();

        assert_eq!(
            config.doc_types,
            BTreeMap::from([("invoice".to_string(), 3), ("receipt".to_string(), 1)])
        );
    }

    #[test]
    fn test_keyed_doc_types_win_over_legacy_lists() {
        let toml = format!("{}\n[doc_types]\ncreditnote = 2\n", LEGACY_TOML);
        let config = load_config_from_str(&toml).unwrap();

        assert_eq!(
            config.doc_types,
            BTreeMap::from([("creditnote".to_string(), 2)])
        );
    }

    #[test]
    fn test_legacy_list_without_hints_is_rejected() {
        let toml = LEGACY_TOML.replace("sqs_max_queues = \"zz_9,invoice_3,receipt_1\"\n", "");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_legacy_list_with_missing_hint_is_rejected() {
        let toml = LEGACY_TOML.replace("invoice_3,", "");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("no hint for invoice"));
    }
}
