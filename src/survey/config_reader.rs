use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::{BTreeMap, HashSet};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "dashboardTitle")]
    pub dashboard_title: Option<String>,
    #[serde(rename = "asOfDate")]
    pub as_of_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub title: String,
    #[serde(rename = "asOfDate")]
    pub as_of_date: String,
    pub respondents: usize,
    pub questions: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LegendConfig {
    pub column: String,
    pub codes: BTreeMap<String, String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub name: String,
    pub order: Vec<String>,
    /// One color per entry of the order.
    pub colors: Option<Vec<String>>,
    #[serde(rename = "valueMapping")]
    pub value_mapping: Option<BTreeMap<String, String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub columns: Option<Vec<JSValue>>,
    #[serde(rename = "columnNames")]
    pub column_names: Option<Vec<String>>,
    #[serde(rename = "answerType")]
    pub answer_type: String,
    pub scale: Option<String>,
    pub order: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct NumericMappingConfig {
    pub columns: Option<Vec<JSValue>>,
    #[serde(rename = "columnNames")]
    pub column_names: Option<Vec<String>>,
    pub scale: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct YesCountConfig {
    pub title: String,
    pub columns: Vec<JSValue>,
    #[serde(rename = "insertAt")]
    pub insert_at: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub subtitle: Option<String>,
    pub columns: Vec<JSValue>,
    #[serde(rename = "yesCount")]
    pub yes_count: Option<YesCountConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MultiSelectConfig {
    pub delimiter: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(rename = "stopWords")]
    pub stop_words: Option<Vec<String>>,
    #[serde(rename = "useDefaultStopWords")]
    pub use_default_stop_words: Option<bool>,
    #[serde(rename = "maxWords")]
    pub max_words: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(rename = "horizontalBarMinOptions")]
    pub horizontal_bar_min_options: Option<usize>,
    #[serde(rename = "horizontalBarMinLabelLength")]
    pub horizontal_bar_min_label_length: Option<usize>,
    #[serde(rename = "lineBreak")]
    pub line_break: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "inputSource")]
    pub input_source: Option<InputSource>,
    pub legends: Option<Vec<LegendConfig>>,
    pub scales: Option<Vec<ScaleConfig>>,
    pub rules: Option<Vec<RuleConfig>>,
    #[serde(rename = "numericMappings")]
    pub numeric_mappings: Option<Vec<NumericMappingConfig>>,
    pub sections: Option<Vec<SectionConfig>>,
    #[serde(rename = "multiSelect")]
    pub multi_select: Option<MultiSelectConfig>,
    pub text: Option<TextConfig>,
    pub charts: Option<ChartsConfig>,
}

pub fn read_config(path: &str) -> BSurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> BSurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Turns the configuration file into the settings of the dashboard.
///
/// Only the shape of the configuration is checked here. The references to
/// the columns of the table are checked when the dashboard is created.
pub fn validate_config(config: &SurveyConfig) -> SurveyResult<DashboardConfig> {
    let custom_scales: Vec<Scale> = config
        .scales
        .iter()
        .flatten()
        .map(read_scale)
        .collect::<SurveyResult<Vec<Scale>>>()?;
    let find_scale = |name: &str| -> SurveyResult<Scale> {
        match custom_scales.iter().find(|s| s.name == name) {
            Some(s) => Ok(s.clone()),
            None => match Scale::builtin(name) {
                Some(s) => Ok(s),
                None => whatever!("unknown scale: {}", name),
            },
        }
    };

    let mut rules: Vec<ColumnRule> = Vec::new();
    for (idx, rc) in config.rules.iter().flatten().enumerate() {
        let answer_type = match rc.answer_type.as_str() {
            "singleSelect" => match &rc.order {
                Some(order) => {
                    check_distinct(&format!("rule {}", idx), order)?;
                    AnswerType::SingleSelectCategorical(Some(CategoryOrder::new(order)))
                }
                None => AnswerType::SingleSelectCategorical(None),
            },
            "ordinal" => match &rc.scale {
                Some(name) => AnswerType::OrdinalScale(find_scale(name.as_str())?),
                None => whatever!("rule {}: an ordinal rule needs a scale", idx),
            },
            "yesNo" => AnswerType::YesNo,
            "multiSelect" => AnswerType::MultiSelect,
            "freeText" => AnswerType::FreeText,
            x => whatever!("rule {}: unknown answer type {:?}", idx, x),
        };
        let selectors = read_selectors(&rc.columns, &rc.column_names)?;
        if selectors.is_empty() {
            whatever!("rule {}: no column selected", idx)
        }
        for columns in selectors {
            rules.push(ColumnRule {
                columns,
                answer_type: answer_type.clone(),
            });
        }
    }

    let mut numeric_mappings: Vec<NumericMapping> = Vec::new();
    for nm in config.numeric_mappings.iter().flatten() {
        let scale = find_scale(nm.scale.as_str())?;
        for columns in read_selectors(&nm.columns, &nm.column_names)? {
            numeric_mappings.push(NumericMapping {
                columns,
                scale: scale.clone(),
            });
        }
    }

    let legends: Vec<Legend> = config
        .legends
        .iter()
        .flatten()
        .map(|l| Legend {
            column: l.column.clone(),
            codes: l
                .codes
                .iter()
                .map(|(c, label)| (c.clone(), label.clone()))
                .collect(),
        })
        .collect();

    let mut sections: Vec<Section> = Vec::new();
    for sc in config.sections.iter().flatten() {
        let mut items: Vec<SectionItem> = Vec::new();
        for v in sc.columns.iter() {
            for position in read_js_positions(v)? {
                items.push(SectionItem::Question(position));
            }
        }
        if let Some(yc) = &sc.yes_count {
            let mut positions: Vec<usize> = Vec::new();
            for v in yc.columns.iter() {
                positions.extend(read_js_positions(v)?);
            }
            let at = yc.insert_at.unwrap_or(items.len()).min(items.len());
            items.insert(
                at,
                SectionItem::YesCount {
                    title: yc.title.clone(),
                    columns: ColumnSelector::Positions(positions),
                },
            );
        }
        sections.push(Section {
            name: sc.name.clone(),
            subtitle: sc.subtitle.clone(),
            items,
        });
    }

    let multi_select = match &config.multi_select {
        Some(ms) => MultiSelectSettings {
            delimiter: match &ms.delimiter {
                Some(d) => read_char(d)?,
                None => MultiSelectSettings::default().delimiter,
            },
            sort_order: match ms.sort_order.as_deref() {
                None | Some("alphabetical") => SortOrder::Alphabetical,
                Some("reverseAlphabetical") => SortOrder::ReverseAlphabetical,
                Some("count") => SortOrder::ByCount,
                Some(x) => whatever!("unknown sort order: {:?}", x),
            },
        },
        None => MultiSelectSettings::default(),
    };

    let text = match &config.text {
        Some(tc) => {
            let mut stop_words = if tc.use_default_stop_words.unwrap_or(true) {
                default_stop_words()
            } else {
                HashSet::new()
            };
            stop_words.extend(tc.stop_words.iter().flatten().cloned());
            TextSettings {
                stop_words,
                max_words: tc.max_words.unwrap_or(TextSettings::default().max_words),
            }
        }
        None => TextSettings::default(),
    };

    let default_charts = ChartSettings::default();
    let charts = match &config.charts {
        Some(cc) => ChartSettings {
            horizontal_bar_min_options: cc
                .horizontal_bar_min_options
                .unwrap_or(default_charts.horizontal_bar_min_options),
            horizontal_bar_min_label_length: cc
                .horizontal_bar_min_label_length
                .unwrap_or(default_charts.horizontal_bar_min_label_length),
            line_break: cc.line_break.clone().unwrap_or(default_charts.line_break),
        },
        None => default_charts,
    };

    Ok(DashboardConfig {
        rules,
        numeric_mappings,
        legends,
        sections,
        multi_select,
        text,
        charts,
    })
}

fn read_scale(sc: &ScaleConfig) -> SurveyResult<Scale> {
    if sc.order.is_empty() {
        whatever!("scale {}: the order is empty", sc.name)
    }
    check_distinct(&format!("scale {}", sc.name), &sc.order)?;
    let mut scale = Scale::new(&sc.name, CategoryOrder::new(&sc.order));
    if let Some(colors) = &sc.colors {
        if colors.len() != sc.order.len() {
            whatever!(
                "scale {}: {} colors for {} labels",
                sc.name,
                colors.len(),
                sc.order.len()
            )
        }
        let entries: Vec<(String, String)> = sc
            .order
            .iter()
            .cloned()
            .zip(colors.iter().cloned())
            .collect();
        scale = scale.with_colors(ColorPolicy::new(&entries));
    }
    if let Some(vm) = &sc.value_mapping {
        let mapping: Vec<(String, String)> =
            vm.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        scale = scale.with_value_mapping(&mapping);
    }
    Ok(scale)
}

// Each label of an order becomes one bar or slice of the chart.
fn check_distinct(what: &str, order: &[String]) -> SurveyResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for label in order.iter() {
        if !seen.insert(label.as_str()) {
            whatever!("{}: the label {:?} appears twice in the order", what, label)
        }
    }
    Ok(())
}

/// A rule may select its columns by position and by name at the same time.
fn read_selectors(
    columns: &Option<Vec<JSValue>>,
    column_names: &Option<Vec<String>>,
) -> SurveyResult<Vec<ColumnSelector>> {
    let mut res: Vec<ColumnSelector> = Vec::new();
    if let Some(cs) = columns {
        match cs.as_slice() {
            // A single range is kept as such, it is checked against the table later.
            [JSValue::String(s)] if s.contains('-') => {
                let (first, last) = read_js_range(s)?;
                res.push(ColumnSelector::Range { first, last });
            }
            _ => {
                let mut positions: Vec<usize> = Vec::new();
                for v in cs.iter() {
                    positions.extend(read_js_positions(v)?);
                }
                res.push(ColumnSelector::Positions(positions));
            }
        }
    }
    if let Some(names) = column_names {
        res.push(ColumnSelector::Named(names.clone()));
    }
    Ok(res)
}

/// The positions designated by a column reference: a 0-based index, an Excel
/// column name, or an inclusive range of either.
pub fn read_js_positions(x: &JSValue) -> SurveyResult<Vec<usize>> {
    match x {
        JSValue::String(s) if s.contains('-') => {
            let (first, last) = read_js_range(s)?;
            if first > last {
                return Err(SurveyError::InvalidDashboard {
                    source: DashboardErrors::InvalidRange { first, last },
                });
            }
            Ok((first..=last).collect())
        }
        _ => Ok(vec![read_js_column(x)?]),
    }
}

fn read_js_range(s: &str) -> SurveyResult<(usize, usize)> {
    match s.split_once('-') {
        Some((first, last)) => Ok((read_column_str(first)?, read_column_str(last)?)),
        None => ParsingColumnRefSnafu { value: s }.fail(),
    }
}

pub fn read_js_column(x: &JSValue) -> SurveyResult<usize> {
    match x {
        JSValue::Number(n) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingColumnRefSnafu {
                value: n.to_string(),
            }),
        JSValue::String(s) => read_column_str(s),
        _ => ParsingColumnRefSnafu {
            value: x.to_string(),
        }
        .fail(),
    }
}

// Parsing the Excel-style columns: A is 0, Z is 25, AA is 26.
fn read_column_str(s: &str) -> SurveyResult<usize> {
    let s = s.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) {
        let mut x: usize = 0;
        for c in s.to_ascii_lowercase().chars() {
            x = x
                .checked_mul(26)
                .and_then(|acc| acc.checked_add(c as usize - 'a' as usize + 1))
                .context(ParsingColumnRefSnafu { value: s })?;
        }
        Ok(x - 1)
    } else {
        s.parse::<usize>()
            .ok()
            .context(ParsingColumnRefSnafu { value: s })
    }
}

pub fn read_char(s: &str) -> SurveyResult<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => whatever!("expected a single character, got {:?}", s),
    }
}
