//! Field-to-config mapping engine.
//!
//! Decides, for every field of a configuration frame, which [`ConfigHandlerKey`] consumes it
//! (explicit user mapping, else the handler whose key equals the lowercased display name),
//! reduces the field to a single input with a [`ReducerId`], and folds all inputs into one
//! [`FieldConfig`].
//!
//! Value mappings are built from three independently mapped fields (`mappings.value`,
//! `mappings.color`, `mappings.text`). Their lists are collected in a [`MappingAccumulator`]
//! threaded through the fold and paired by position once every field has been seen.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{FieldColor, FieldConfig, MappingType, ThresholdsConfig, ValueMapping, ValueMappingResult};
use crate::processing::{reduce_field, ReducerId, Reduction};
use crate::types::{DataFrame, FieldType, Value};

/// The closed set of config properties a field can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigHandlerKey {
    DisplayName,
    Unit,
    Min,
    Max,
    Decimals,
    NoValue,
    Color,
    Threshold1,
    Threshold2,
    Threshold3,
    MappingsValue,
    MappingsColor,
    MappingsText,
    /// Source of output field names (rows-to-fields only).
    FieldName,
    /// Source of output field values (rows-to-fields only).
    FieldValue,
    /// Row label (rows-to-fields only).
    FieldLabel,
}

impl ConfigHandlerKey {
    pub const ALL: [ConfigHandlerKey; 16] = [
        ConfigHandlerKey::DisplayName,
        ConfigHandlerKey::Unit,
        ConfigHandlerKey::Min,
        ConfigHandlerKey::Max,
        ConfigHandlerKey::Decimals,
        ConfigHandlerKey::NoValue,
        ConfigHandlerKey::Color,
        ConfigHandlerKey::Threshold1,
        ConfigHandlerKey::Threshold2,
        ConfigHandlerKey::Threshold3,
        ConfigHandlerKey::MappingsValue,
        ConfigHandlerKey::MappingsColor,
        ConfigHandlerKey::MappingsText,
        ConfigHandlerKey::FieldName,
        ConfigHandlerKey::FieldValue,
        ConfigHandlerKey::FieldLabel,
    ];

    /// Key used in user mappings and for automatic matching.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigHandlerKey::DisplayName => "displayName",
            ConfigHandlerKey::Unit => "unit",
            ConfigHandlerKey::Min => "min",
            ConfigHandlerKey::Max => "max",
            ConfigHandlerKey::Decimals => "decimals",
            ConfigHandlerKey::NoValue => "noValue",
            ConfigHandlerKey::Color => "color",
            ConfigHandlerKey::Threshold1 => "threshold1",
            ConfigHandlerKey::Threshold2 => "threshold2",
            ConfigHandlerKey::Threshold3 => "threshold3",
            ConfigHandlerKey::MappingsValue => "mappings.value",
            ConfigHandlerKey::MappingsColor => "mappings.color",
            ConfigHandlerKey::MappingsText => "mappings.text",
            ConfigHandlerKey::FieldName => "field.name",
            ConfigHandlerKey::FieldValue => "field.value",
            ConfigHandlerKey::FieldLabel => "field.label",
        }
    }

    /// Human label.
    pub fn label(&self) -> &'static str {
        match self {
            ConfigHandlerKey::DisplayName => "Display name",
            ConfigHandlerKey::Unit => "Unit",
            ConfigHandlerKey::Min => "Min",
            ConfigHandlerKey::Max => "Max",
            ConfigHandlerKey::Decimals => "Decimals",
            ConfigHandlerKey::NoValue => "No value",
            ConfigHandlerKey::Color => "Color",
            ConfigHandlerKey::Threshold1 => "Threshold",
            ConfigHandlerKey::Threshold2 => "Threshold 2",
            ConfigHandlerKey::Threshold3 => "Threshold 3",
            ConfigHandlerKey::MappingsValue => "Value mappings / Value",
            ConfigHandlerKey::MappingsColor => "Value mappings / Color",
            ConfigHandlerKey::MappingsText => "Value mappings / Text",
            ConfigHandlerKey::FieldName => "Field name",
            ConfigHandlerKey::FieldValue => "Field value",
            ConfigHandlerKey::FieldLabel => "Field label",
        }
    }

    /// Reducer used when the user mapping does not name one.
    pub fn default_reducer(&self) -> Option<ReducerId> {
        match self {
            ConfigHandlerKey::MappingsValue
            | ConfigHandlerKey::MappingsColor
            | ConfigHandlerKey::MappingsText => Some(ReducerId::AllValues),
            _ => None,
        }
    }

    /// `true` for the handlers that only exist in name-and-value mode.
    pub fn is_name_and_value_role(&self) -> bool {
        matches!(
            self,
            ConfigHandlerKey::FieldName | ConfigHandlerKey::FieldValue | ConfigHandlerKey::FieldLabel
        )
    }

    /// Case-insensitive handler lookup. Name-and-value roles are only found when
    /// `with_name_and_value` is set.
    pub fn lookup(key: &str, with_name_and_value: bool) -> Option<Self> {
        ConfigHandlerKey::ALL.into_iter().find(|h| {
            (with_name_and_value || !h.is_name_and_value_role()) && h.key().eq_ignore_ascii_case(key)
        })
    }

    /// Feed one input into the config. Inputs the handler cannot use leave everything unchanged.
    pub fn apply(
        self,
        input: &Reduction,
        mut config: FieldConfig,
        mut acc: MappingAccumulator,
    ) -> (FieldConfig, MappingAccumulator) {
        let scalar = input.as_scalar().filter(|v| !v.is_nullish());
        match self {
            ConfigHandlerKey::DisplayName => {
                if let Some(v) = scalar {
                    config.display_name = Some(v.to_string());
                }
            }
            ConfigHandlerKey::Unit => {
                if let Some(v) = scalar {
                    config.unit = Some(v.to_string());
                }
            }
            ConfigHandlerKey::NoValue => {
                if let Some(v) = scalar {
                    config.no_value = Some(v.to_string());
                }
            }
            ConfigHandlerKey::Min => {
                if let Some(n) = scalar.and_then(Value::to_number_lenient) {
                    config.min = Some(n);
                }
            }
            ConfigHandlerKey::Max => {
                if let Some(n) = scalar.and_then(Value::to_number_lenient) {
                    config.max = Some(n);
                }
            }
            ConfigHandlerKey::Decimals => {
                if let Some(n) = scalar.and_then(Value::to_number_lenient) {
                    config.decimals = Some(n);
                }
            }
            ConfigHandlerKey::Color => {
                if let Some(v) = scalar {
                    config.color = Some(FieldColor::fixed(v.to_string()));
                }
            }
            ConfigHandlerKey::Threshold1 | ConfigHandlerKey::Threshold2 | ConfigHandlerKey::Threshold3 => {
                if let Some(n) = scalar.and_then(Value::to_number_lenient) {
                    config
                        .thresholds
                        .get_or_insert_with(ThresholdsConfig::seeded)
                        .push_step(n);
                }
            }
            ConfigHandlerKey::MappingsValue => acc.values = list_of(input).or(acc.values),
            ConfigHandlerKey::MappingsColor => acc.colors = list_of(input).or(acc.colors),
            ConfigHandlerKey::MappingsText => acc.texts = list_of(input).or(acc.texts),
            ConfigHandlerKey::FieldName | ConfigHandlerKey::FieldValue | ConfigHandlerKey::FieldLabel => {}
        }
        (config, acc)
    }
}

fn list_of(input: &Reduction) -> Option<Vec<Value>> {
    match input {
        Reduction::Values(v) => Some(v.clone()),
        Reduction::Scalar(v) if v.is_nullish() => None,
        Reduction::Scalar(v) => Some(vec![v.clone()]),
    }
}

/// Cross-field state collected while folding a frame into a config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingAccumulator {
    pub values: Option<Vec<Value>>,
    pub colors: Option<Vec<Value>>,
    pub texts: Option<Vec<Value>>,
}

impl MappingAccumulator {
    /// Pair values, colors and texts by position into a single value-to-text mapping.
    ///
    /// Returns `None` when no field was mapped to `mappings.value`. Null values are skipped
    /// but still consume their index.
    pub fn into_mappings(self) -> Option<Vec<ValueMapping>> {
        let values = self.values?;
        let pick = |list: &Option<Vec<Value>>, i: usize| {
            list.as_ref()
                .and_then(|l| l.get(i))
                .filter(|v| !v.is_nullish())
                .map(Value::to_string)
        };
        let mut mapping = ValueMapping {
            mapping_type: MappingType::ValueToText,
            ..Default::default()
        };
        for (index, value) in values.iter().enumerate() {
            if value.is_nullish() {
                continue;
            }
            mapping.options.insert(
                value.to_string(),
                ValueMappingResult {
                    text: pick(&self.texts, index),
                    color: pick(&self.colors, index),
                    index,
                },
            );
        }
        Some(vec![mapping])
    }
}

/// A user-authored mapping of one config-frame field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldToConfigMapping {
    /// Display name of the field in the config frame.
    pub field_name: String,
    /// Handler key; `None` explicitly ignores the field.
    #[serde(default)]
    pub handler_key: Option<String>,
    /// Reducer override.
    #[serde(default)]
    pub reducer_id: Option<ReducerId>,
}

/// How one field of a config frame is used.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMappingEntry {
    pub display_name: String,
    /// `false` when the user mapped this field explicitly.
    pub automatic: bool,
    pub handler: Option<ConfigHandlerKey>,
    pub reducer: ReducerId,
}

/// Mapping decisions for every field of a frame, by field index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMappingResult {
    pub entries: Vec<FieldMappingEntry>,
    /// Field index used as the name source (name-and-value mode).
    pub name_field: Option<usize>,
    /// Field index used as the value source (name-and-value mode).
    pub value_field: Option<usize>,
}

impl FieldMappingResult {
    /// Entry for a display name.
    pub fn entry(&self, display_name: &str) -> Option<&FieldMappingEntry> {
        self.entries.iter().find(|e| e.display_name == display_name)
    }
}

/// Resolve a handler and reducer for every field of `frame`.
///
/// In name-and-value mode, when nothing was mapped to `field.name`/`field.value`, the first
/// automatically mapped string field becomes the name source and the first automatically mapped
/// number field the value source. This follows field order and nothing else. Remaining
/// automatic fields without a handler become `field.label`.
pub fn evaluate_field_mappings(
    frame: &DataFrame,
    mappings: &[FieldToConfigMapping],
    with_name_and_value: bool,
) -> FieldMappingResult {
    let mut result = FieldMappingResult::default();

    for (index, display_name) in frame.display_names().into_iter().enumerate() {
        let manual = mappings.iter().find(|m| m.field_name == display_name);
        let handler = match manual {
            Some(m) => m.handler_key.as_deref().and_then(|key| {
                let found = ConfigHandlerKey::lookup(key, with_name_and_value);
                if found.is_none() {
                    warn!(field = %display_name, handler = key, "unknown config handler, field ignored");
                }
                found
            }),
            None => ConfigHandlerKey::lookup(&display_name.to_lowercase(), with_name_and_value),
        };
        let reducer = manual
            .and_then(|m| m.reducer_id)
            .or_else(|| handler.and_then(|h| h.default_reducer()))
            .unwrap_or(ReducerId::LastNotNull);

        if result.name_field.is_none() && handler == Some(ConfigHandlerKey::FieldName) {
            result.name_field = Some(index);
        }
        if result.value_field.is_none() && handler == Some(ConfigHandlerKey::FieldValue) {
            result.value_field = Some(index);
        }
        result.entries.push(FieldMappingEntry {
            display_name,
            automatic: manual.is_none(),
            handler,
            reducer,
        });
    }

    if !with_name_and_value {
        return result;
    }

    if result.name_field.is_none() {
        result.name_field = first_automatic_of_type(frame, &result, FieldType::String, None);
        if let Some(i) = result.name_field {
            result.entries[i].handler = Some(ConfigHandlerKey::FieldName);
        }
    }
    if result.value_field.is_none() {
        result.value_field = first_automatic_of_type(frame, &result, FieldType::Number, result.name_field);
        if let Some(i) = result.value_field {
            result.entries[i].handler = Some(ConfigHandlerKey::FieldValue);
        }
    }
    for entry in result.entries.iter_mut() {
        if entry.automatic && entry.handler.is_none() {
            entry.handler = Some(ConfigHandlerKey::FieldLabel);
        }
    }
    result
}

fn first_automatic_of_type(
    frame: &DataFrame,
    result: &FieldMappingResult,
    field_type: FieldType,
    exclude: Option<usize>,
) -> Option<usize> {
    frame
        .fields
        .iter()
        .zip(&result.entries)
        .enumerate()
        .find(|(i, (field, entry))| {
            Some(*i) != exclude && entry.automatic && entry.handler.is_none() && field.field_type == field_type
        })
        .map(|(i, _)| i)
}

/// Reduce every field of a config frame with its resolved reducer.
pub fn reduce_config_frame(frame: &DataFrame, result: &FieldMappingResult) -> Vec<Reduction> {
    frame
        .fields
        .iter()
        .zip(&result.entries)
        .map(|(field, entry)| reduce_field(field, entry.reducer))
        .collect()
}

/// Fold one input per field (in field order) into a config.
pub fn config_from_reductions(inputs: &[Reduction], result: &FieldMappingResult) -> FieldConfig {
    let (config, acc) = inputs.iter().zip(&result.entries).fold(
        (FieldConfig::default(), MappingAccumulator::default()),
        |(config, acc), (input, entry)| match entry.handler {
            Some(handler) => handler.apply(input, config, acc),
            None => (config, acc),
        },
    );
    match acc.into_mappings() {
        Some(mappings) => FieldConfig {
            mappings: Some(mappings),
            ..config
        },
        None => config,
    }
}

/// The config described by row `row_index` of `frame`.
///
/// Null cells are skipped, so they never overwrite a property.
pub fn get_field_config_from_frame(
    frame: &DataFrame,
    row_index: usize,
    result: &FieldMappingResult,
) -> FieldConfig {
    let inputs: Vec<Reduction> = frame
        .fields
        .iter()
        .map(|f| Reduction::Scalar(f.values.get(row_index).cloned().unwrap_or_default()))
        .collect();
    config_from_reductions(&inputs, result)
}
