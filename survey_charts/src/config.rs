// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// Label used for a respondent who left a categorical question blank.
pub const NO_ANSWER: &str = "No Answer";

/// Bucket collecting the ordinal answers that are missing or that do not
/// belong to the declared scale.
pub const UNKNOWN: &str = "Unknown";

/// Color given to every label that a color policy does not know about.
pub const NEUTRAL_COLOR: &str = "#bdbdbd";

pub const YES: &str = "Yes";
pub const NO: &str = "No";

pub const YES_COLOR: &str = "#1a9850";
pub const NO_COLOR: &str = "#d73027";

/// Red to green, from the most negative to the most positive sentiment.
pub const DIVERGING_PALETTE: [&str; 9] = [
    "#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a", "#66bd63",
    "#1a9850",
];

/// Sequential blues, darkest first.
pub const BLUES_PALETTE: [&str; 9] = [
    "#08306b", "#08519c", "#2171b5", "#4292c6", "#6baed6", "#9ecae1", "#c6dbef", "#deebf7",
    "#f7fbff",
];

/// An explicit ranked sequence of canonical labels.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CategoryOrder {
    labels: Vec<String>,
}

impl CategoryOrder {
    pub fn new(labels: &[String]) -> CategoryOrder {
        CategoryOrder {
            labels: labels.to_vec(),
        }
    }

    pub fn from_strs(labels: &[&str]) -> CategoryOrder {
        CategoryOrder {
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The rank (0-based) of a label in this order.
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// Mapping from a canonical label to a display color.
///
/// The lookup is total: labels that are not part of the policy, and the
/// reserved labels [`NO_ANSWER`] and [`UNKNOWN`], receive the neutral color.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ColorPolicy {
    entries: Vec<(String, String)>,
    neutral: String,
}

impl ColorPolicy {
    pub fn new(entries: &[(String, String)]) -> ColorPolicy {
        ColorPolicy {
            entries: entries.to_vec(),
            neutral: NEUTRAL_COLOR.to_string(),
        }
    }

    /// Green for the affirmative answer, red for the negative one.
    pub fn yes_no() -> ColorPolicy {
        ColorPolicy::new(&[
            (YES.to_string(), YES_COLOR.to_string()),
            (NO.to_string(), NO_COLOR.to_string()),
        ])
    }

    /// A sequential ramp from negative to positive sentiment, one color per rank.
    ///
    /// The ranks are spread evenly over [`DIVERGING_PALETTE`] so that the first
    /// and the last rank always get the two ends of the palette.
    pub fn ramp(order: &CategoryOrder) -> ColorPolicy {
        let n = order.len();
        let last = DIVERGING_PALETTE.len() - 1;
        let entries: Vec<(String, String)> = order
            .labels()
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let pos = if n <= 1 {
                    last / 2
                } else {
                    (idx * last + (n - 1) / 2) / (n - 1)
                };
                (label.clone(), DIVERGING_PALETTE[pos].to_string())
            })
            .collect();
        ColorPolicy::new(&entries)
    }

    /// Assigns the colors of a palette to the labels in order, cycling when
    /// there are more labels than colors.
    pub fn sequential(labels: &[String], palette: &[&str]) -> ColorPolicy {
        if palette.is_empty() {
            return ColorPolicy::new(&[]);
        }
        let entries: Vec<(String, String)> = labels
            .iter()
            .filter(|l| !is_reserved_label(l))
            .enumerate()
            .map(|(idx, label)| (label.clone(), palette[idx % palette.len()].to_string()))
            .collect();
        ColorPolicy::new(&entries)
    }

    /// Colors each label by its count relative to the largest count, from red
    /// (rarest) to green (most frequent).
    pub fn by_magnitude(aggregate: &AggregateResult) -> ColorPolicy {
        let max_count = aggregate.max_count();
        let last = DIVERGING_PALETTE.len() as u64 - 1;
        let entries: Vec<(String, String)> = aggregate
            .entries()
            .iter()
            .map(|(label, count)| {
                let pos = if max_count == 0 {
                    0
                } else {
                    (count * last + max_count / 2) / max_count
                };
                (label.clone(), DIVERGING_PALETTE[pos as usize].to_string())
            })
            .collect();
        ColorPolicy::new(&entries)
    }

    pub fn color_for(&self, label: &str) -> &str {
        if is_reserved_label(label) {
            return &self.neutral;
        }
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| c.as_str())
            .unwrap_or(&self.neutral)
    }
}

pub fn is_reserved_label(label: &str) -> bool {
    label == NO_ANSWER || label == UNKNOWN
}

/// A named ordinal scale.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Scale {
    pub name: String,
    pub order: CategoryOrder,
    /// Explicit colors. When absent, a ramp over the order is used.
    pub colors: Option<ColorPolicy>,
    /// Raw code to canonical label, for instance `1 -> Very Poor`.
    pub value_mapping: Vec<(String, String)>,
}

impl Scale {
    pub fn new(name: &str, order: CategoryOrder) -> Scale {
        Scale {
            name: name.to_string(),
            order,
            colors: None,
            value_mapping: Vec::new(),
        }
    }

    pub fn with_colors(self, colors: ColorPolicy) -> Scale {
        Scale {
            colors: Some(colors),
            ..self
        }
    }

    pub fn with_value_mapping(self, value_mapping: &[(String, String)]) -> Scale {
        Scale {
            value_mapping: value_mapping.to_vec(),
            ..self
        }
    }

    /// Four point quality scale, coded 1 to 4 in the raw data.
    pub fn quality() -> Scale {
        let labels = ["Very Poor", "Poor", "Good", "Very Good"];
        let mapping: Vec<(String, String)> = labels
            .iter()
            .enumerate()
            .map(|(idx, l)| ((idx + 1).to_string(), l.to_string()))
            .collect();
        Scale::new("quality", CategoryOrder::from_strs(&labels)).with_value_mapping(&mapping)
    }

    pub fn agreement() -> Scale {
        let labels = [
            "I fully disagree",
            "I slightly disagree",
            "I slightly agree",
            "I fully agree",
        ];
        let colors = ["#d73027", "#fc8d59", "#fee08b", "#1a9850"];
        let entries: Vec<(String, String)> = labels
            .iter()
            .zip(colors.iter())
            .map(|(l, c)| (l.to_string(), c.to_string()))
            .collect();
        Scale::new("agreement", CategoryOrder::from_strs(&labels))
            .with_colors(ColorPolicy::new(&entries))
    }

    pub fn interest() -> Scale {
        Scale::new(
            "interest",
            CategoryOrder::from_strs(&[
                "Not interested",
                "Slightly interested",
                "Interested",
                "Very interested",
            ]),
        )
    }

    pub fn builtin(name: &str) -> Option<Scale> {
        match name {
            "quality" => Some(Scale::quality()),
            "agreement" => Some(Scale::agreement()),
            "interest" => Some(Scale::interest()),
            _ => None,
        }
    }

    pub fn color_policy(&self) -> ColorPolicy {
        match &self.colors {
            Some(c) => c.clone(),
            None => ColorPolicy::ramp(&self.order),
        }
    }

    /// The rank of a raw answer on this scale, after applying the value mapping.
    ///
    /// Numeric codes are also matched in their integral form, so that `4.0`
    /// finds the entry of `4`.
    pub fn rank_of(&self, raw: &str) -> Option<usize> {
        let raw = raw.trim();
        let label = self.mapped_label(raw).unwrap_or(raw);
        self.order.rank(label)
    }

    fn mapped_label(&self, raw: &str) -> Option<&str> {
        let lookup = |key: &str| {
            self.value_mapping
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        lookup(raw).or_else(|| match raw.parse::<f64>() {
            Ok(x) if x.fract() == 0.0 && x.is_finite() => lookup(&format!("{}", x as i64)),
            _ => None,
        })
    }
}

/// The semantic type of a question. It governs how the answers are counted
/// and charted.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AnswerType {
    /// One choice among a set of categories, possibly with a fixed display order.
    SingleSelectCategorical(Option<CategoryOrder>),
    /// A ranked scale: every rank is always reported, even at zero.
    OrdinalScale(Scale),
    YesNo,
    /// Several choices joined by a delimiter in a single cell.
    MultiSelect,
    FreeText,
}

impl AnswerType {
    pub fn name(&self) -> &'static str {
        match self {
            AnswerType::SingleSelectCategorical(_) => "singleSelect",
            AnswerType::OrdinalScale(_) => "ordinal",
            AnswerType::YesNo => "yesNo",
            AnswerType::MultiSelect => "multiSelect",
            AnswerType::FreeText => "freeText",
        }
    }
}

// ********* Configuration **********

/// Selects a set of columns of the response table.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ColumnSelector {
    Positions(Vec<usize>),
    /// Inclusive range of positions.
    Range { first: usize, last: usize },
    /// Exact header names.
    Named(Vec<String>),
}

impl ColumnSelector {
    pub fn matches(&self, position: usize, name: &str) -> bool {
        match self {
            ColumnSelector::Positions(ps) => ps.contains(&position),
            ColumnSelector::Range { first, last } => *first <= position && position <= *last,
            ColumnSelector::Named(names) => names.iter().any(|n| n == name),
        }
    }
}

/// A statically declared answer type for a set of columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnRule {
    pub columns: ColumnSelector,
    pub answer_type: AnswerType,
}

/// A scale applied to the columns that turn out to hold only numeric codes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NumericMapping {
    pub columns: ColumnSelector,
    pub scale: Scale,
}

/// Replacement of raw codes by labels for the column with the given header.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Legend {
    pub column: String,
    pub codes: Vec<(String, String)>,
}

impl Legend {
    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.codes
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, l)| l.as_str())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SortOrder {
    Alphabetical,
    ReverseAlphabetical,
    /// Most frequent first, ties broken by label.
    ByCount,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MultiSelectSettings {
    pub delimiter: char,
    pub sort_order: SortOrder,
}

impl Default for MultiSelectSettings {
    fn default() -> Self {
        MultiSelectSettings {
            delimiter: ',',
            sort_order: SortOrder::Alphabetical,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TextSettings {
    /// Matched exactly, case included.
    pub stop_words: HashSet<String>,
    pub max_words: usize,
}

impl Default for TextSettings {
    fn default() -> Self {
        TextSettings {
            stop_words: default_stop_words(),
            max_words: 50,
        }
    }
}

/// Common English words, plus the words of the survey domain that would
/// otherwise dominate every word cloud.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "else",
    "ever", "few", "for", "from", "further", "get", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into",
    "is", "it", "its", "itself", "just", "like", "me", "more", "most", "my", "myself", "no", "nor",
    "not", "of", "off", "on", "once", "only", "or", "other", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "same", "shall", "she", "should", "since", "so", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "with",
    "would", "you", "your", "yours", "yourself", "yourselves", "survey", "data", "result", "Data",
    "value", "Lake", "Blue", "Cloud", "EDITO", "user", "s",
];

pub fn default_stop_words() -> HashSet<String> {
    DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect()
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartSettings {
    /// Bars are laid out horizontally from this number of options on.
    pub horizontal_bar_min_options: usize,
    /// Bars are laid out horizontally as soon as one label reaches this length.
    pub horizontal_bar_min_label_length: usize,
    /// Replaces every `/` of a title.
    pub line_break: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        ChartSettings {
            horizontal_bar_min_options: 6,
            horizontal_bar_min_label_length: 30,
            line_break: "<br>".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SectionItem {
    Question(usize),
    /// A single bar chart counting the affirmative answers of each column.
    YesCount {
        title: String,
        columns: ColumnSelector,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Section {
    pub name: String,
    pub subtitle: Option<String>,
    pub items: Vec<SectionItem>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DashboardConfig {
    /// Declared answer types. The first matching rule wins.
    pub rules: Vec<ColumnRule>,
    pub numeric_mappings: Vec<NumericMapping>,
    pub legends: Vec<Legend>,
    /// When empty, a single section lists every column.
    pub sections: Vec<Section>,
    pub multi_select: MultiSelectSettings,
    pub text: TextSettings,
    pub charts: ChartSettings,
}

impl DashboardConfig {
    pub fn legend_for(&self, column: &str) -> Option<&Legend> {
        self.legends.iter().find(|l| l.column == column)
    }
}

// ******** Output data structures *********

/// Ordered (label, count) pairs.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregateResult {
    entries: Vec<(String, u64)>,
}

impl AggregateResult {
    pub fn new(entries: Vec<(String, u64)>) -> AggregateResult {
        AggregateResult { entries }
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.entries.iter().map(|(_, c)| *c).collect()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The outcome of aggregating one column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Aggregation {
    Tally(AggregateResult),
    /// Nothing could be counted: every cell is missing, or nothing survived
    /// the filtering.
    NoResponses,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ChartKind {
    Pie,
    Bar,
    WordCloud,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
            ChartKind::WordCloud => "wordCloud",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn name(&self) -> &'static str {
        match self {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
        }
    }
}

/// A declarative, renderer-agnostic description of one chart.
///
/// `labels`, `values` and `colors` have the same length and are in display order.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<String>,
    pub orientation: Orientation,
}

pub const NO_RESPONSES_MESSAGE: &str = "No valid responses for this question.";

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ChartOutput {
    Chart(ChartSpec),
    Placeholder { title: String, message: String },
}

/// One rendered item of a section.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Panel {
    /// The question position, absent for the combined yes-count view.
    pub position: Option<usize>,
    pub answer_type: Option<AnswerType>,
    pub output: ChartOutput,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionView {
    pub name: String,
    pub subtitle: Option<String>,
    pub panels: Vec<Panel>,
}

/// Errors in the configuration of a dashboard, or in a request made to it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DashboardErrors {
    EmptyHeader,
    RaggedRow {
        row: usize,
        num_cells: usize,
        num_columns: usize,
    },
    ColumnOutOfRange {
        position: usize,
        num_columns: usize,
    },
    UnknownColumn(String),
    InvalidRange {
        first: usize,
        last: usize,
    },
    OverlappingRules {
        position: usize,
    },
    DuplicateSection(String),
    InvalidTextSettings,
    UnknownSection(String),
}

impl Error for DashboardErrors {}

impl Display for DashboardErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardErrors::EmptyHeader => write!(f, "the response table has no column"),
            DashboardErrors::RaggedRow {
                row,
                num_cells,
                num_columns,
            } => write!(
                f,
                "row {} has {} cells but the table only has {} columns",
                row, num_cells, num_columns
            ),
            DashboardErrors::ColumnOutOfRange {
                position,
                num_columns,
            } => write!(
                f,
                "column position {} is out of range (the table has {} columns)",
                position, num_columns
            ),
            DashboardErrors::UnknownColumn(name) => write!(f, "no column named {:?}", name),
            DashboardErrors::InvalidRange { first, last } => {
                write!(f, "invalid column range {}-{}", first, last)
            }
            DashboardErrors::OverlappingRules { position } => write!(
                f,
                "column {} is claimed by more than one answer type rule",
                position
            ),
            DashboardErrors::DuplicateSection(name) => {
                write!(f, "section {:?} is declared more than once", name)
            }
            DashboardErrors::InvalidTextSettings => {
                write!(f, "the maximum number of words must be positive")
            }
            DashboardErrors::UnknownSection(name) => write!(f, "unknown section {:?}", name),
        }
    }
}
