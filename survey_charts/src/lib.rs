/*!
Classification and aggregation of survey answers into chart specifications.

The response table is loaded once, then every question of a dashboard section
goes through the same pipeline:

1. the legend of its column, if any, replaces raw codes by labels ([`normalize`]),
2. the question receives an answer type ([`classify`]),
3. the answers are counted according to that type ([`aggregate`]),
4. the counts become a declarative chart ([`build_chart`]).

[`Dashboard`] holds the table and the validated configuration and runs the
pipeline for a whole section. See the [`manual`] for the configuration options.
*/

mod aggregate;
pub mod builder;
mod chart;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

pub use crate::aggregate::aggregate;
pub use crate::chart::{build_chart, build_yes_count_chart, default_color_policy, format_title};
pub use crate::config::*;

/// The answers of all the respondents. It never changes once built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseTable {
    pub(crate) headers: Vec<String>,
    // Column-major: one vector of cells per question.
    pub(crate) columns: Vec<Vec<Option<String>>>,
    pub(crate) num_rows: usize,
}

/// One column of the response table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Question<'a> {
    /// 0-based position of the column.
    pub position: usize,
    /// The header text.
    pub name: &'a str,
    pub cells: &'a [Option<String>],
}

impl ResponseTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn respondent_count(&self) -> usize {
        self.num_rows
    }

    pub fn question(&self, position: usize) -> Option<Question<'_>> {
        let name = self.headers.get(position)?;
        let cells = self.columns.get(position)?;
        Some(Question {
            position,
            name: name.as_str(),
            cells: cells.as_slice(),
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = Question<'_>> {
        (0..self.num_columns()).filter_map(move |p| self.question(p))
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Replaces the raw codes of a column by the labels of its legend.
///
/// Codes that are not part of the legend are kept as they are, missing answers
/// stay missing. The table itself is not modified: the cells that do not change
/// are borrowed.
pub fn normalize<'a>(question: &Question<'a>, legend: Option<&Legend>) -> Vec<Option<Cow<'a, str>>> {
    question
        .cells
        .iter()
        .map(|cell| {
            cell.as_deref().map(|raw| match legend.and_then(|l| l.label_for(raw)) {
                Some(label) => Cow::Owned(label.to_string()),
                None => Cow::Borrowed(raw),
            })
        })
        .collect()
}

/// Assigns an answer type to a question. It never fails: a question that
/// matches no rule is free text.
///
/// The declared rules are tried first, in order. Then the answers themselves
/// decide: exactly `Yes` and `No` make a yes/no question, a delimiter in most
/// of the answers makes a multi-select question, and numeric codes make an
/// ordinal question if a numeric mapping is configured for the column.
pub fn classify<S: AsRef<str>>(
    question: &Question,
    cells: &[Option<S>],
    config: &DashboardConfig,
) -> AnswerType {
    if let Some(rule) = config
        .rules
        .iter()
        .find(|r| r.columns.matches(question.position, question.name))
    {
        debug!(
            "classify: column {} matches a declared {} rule",
            question.position,
            rule.answer_type.name()
        );
        return rule.answer_type.clone();
    }

    let answers: Vec<&str> = cells
        .iter()
        .filter_map(|c| c.as_ref().map(|s| s.as_ref().trim()))
        .filter(|s| !s.is_empty())
        .collect();

    let distinct: HashSet<&str> = answers.iter().cloned().collect();
    if distinct.len() == 2 && distinct.contains(YES) && distinct.contains(NO) {
        return AnswerType::YesNo;
    }

    let delimiter = config.multi_select.delimiter;
    let num_lists = answers.iter().filter(|s| s.contains(delimiter)).count();
    if !answers.is_empty() && 2 * num_lists > answers.len() {
        return AnswerType::MultiSelect;
    }

    if let Some(mapping) = config
        .numeric_mappings
        .iter()
        .find(|m| m.columns.matches(question.position, question.name))
    {
        if !answers.is_empty() && answers.iter().all(|s| s.parse::<f64>().is_ok()) {
            return AnswerType::OrdinalScale(mapping.scale.clone());
        }
        debug!(
            "classify: column {} has a numeric mapping but non numeric answers",
            question.position
        );
    }

    debug!(
        "classify: no rule for column {}: {:?}, using free text",
        question.position, question.name
    );
    AnswerType::FreeText
}

/// Runs the whole pipeline for a single question.
pub fn render_question(question: &Question, config: &DashboardConfig) -> Panel {
    let cells = normalize(question, config.legend_for(question.name));
    let answer_type = classify(question, &cells, config);
    let output = match aggregate(&cells, &answer_type, config) {
        Aggregation::Tally(res) => {
            let colors = default_color_policy(&answer_type, &res);
            ChartOutput::Chart(build_chart(
                &res,
                &answer_type,
                &colors,
                question.name,
                &config.charts,
            ))
        }
        Aggregation::NoResponses => ChartOutput::Placeholder {
            title: format_title(question.name, &config.charts.line_break),
            message: NO_RESPONSES_MESSAGE.to_string(),
        },
    };
    Panel {
        position: Some(question.position),
        answer_type: Some(answer_type),
        output,
    }
}

/// The number of `Yes` answers in each of the selected columns, labelled by header.
pub fn count_yes(table: &ResponseTable, columns: &ColumnSelector, config: &DashboardConfig) -> Aggregation {
    let mut entries: Vec<(String, u64)> = Vec::new();
    let mut num_answered = 0;
    for q in table
        .questions()
        .filter(|q| columns.matches(q.position, q.name))
    {
        let cells = normalize(&q, config.legend_for(q.name));
        num_answered += cells.iter().filter(|c| c.is_some()).count();
        let yes = cells
            .iter()
            .filter(|c| c.as_deref().map(str::trim) == Some(YES))
            .count();
        entries.push((q.name.to_string(), yes as u64));
    }
    if num_answered == 0 {
        Aggregation::NoResponses
    } else {
        Aggregation::Tally(AggregateResult::new(entries))
    }
}

fn render_yes_count(
    table: &ResponseTable,
    title: &str,
    columns: &ColumnSelector,
    config: &DashboardConfig,
) -> Panel {
    let output = match count_yes(table, columns, config) {
        Aggregation::Tally(res) => {
            ChartOutput::Chart(build_yes_count_chart(&res, title, &config.charts))
        }
        Aggregation::NoResponses => ChartOutput::Placeholder {
            title: format_title(title, &config.charts.line_break),
            message: NO_RESPONSES_MESSAGE.to_string(),
        },
    };
    Panel {
        position: None,
        answer_type: None,
        output,
    }
}

/// The name of the section used when the configuration does not declare any.
pub const ALL_QUESTIONS: &str = "All questions";

/// A response table together with its validated configuration.
///
/// Rendering a section only reads from the dashboard: rendering the same
/// section twice gives the same result.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: ResponseTable,
    config: DashboardConfig,
    sections: Vec<Section>,
}

impl Dashboard {
    pub fn new(table: ResponseTable, config: DashboardConfig) -> Result<Dashboard, DashboardErrors> {
        validate(&table, &config)?;
        let sections = if config.sections.is_empty() {
            vec![Section {
                name: ALL_QUESTIONS.to_string(),
                subtitle: None,
                items: (0..table.num_columns()).map(SectionItem::Question).collect(),
            }]
        } else {
            config.sections.clone()
        };
        info!(
            "Dashboard: {} respondents, {} questions, {} sections",
            table.respondent_count(),
            table.num_columns(),
            sections.len()
        );
        Ok(Dashboard {
            table,
            config,
            sections,
        })
    }

    pub fn table(&self) -> &ResponseTable {
        &self.table
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn respondent_count(&self) -> usize {
        self.table.respondent_count()
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn render_question(&self, position: usize) -> Result<Panel, DashboardErrors> {
        let q = self
            .table
            .question(position)
            .ok_or(DashboardErrors::ColumnOutOfRange {
                position,
                num_columns: self.table.num_columns(),
            })?;
        Ok(render_question(&q, &self.config))
    }

    pub fn render_section(&self, name: &str) -> Result<SectionView, DashboardErrors> {
        let section = self
            .sections
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DashboardErrors::UnknownSection(name.to_string()))?;
        info!("render_section: {:?}", section.name);
        let mut panels: Vec<Panel> = Vec::new();
        for item in section.items.iter() {
            let panel = match item {
                SectionItem::Question(position) => self.render_question(*position)?,
                SectionItem::YesCount { title, columns } => {
                    render_yes_count(&self.table, title, columns, &self.config)
                }
            };
            panels.push(panel);
        }
        Ok(SectionView {
            name: section.name.clone(),
            subtitle: section.subtitle.clone(),
            panels,
        })
    }
}

/// Checks that a configuration can be used with a table.
///
/// All the referenced columns must exist, and no column may be claimed by two
/// declared rules.
pub fn validate(table: &ResponseTable, config: &DashboardConfig) -> Result<(), DashboardErrors> {
    let num_columns = table.num_columns();
    let mut claimed: HashMap<usize, usize> = HashMap::new();
    for (rule_idx, rule) in config.rules.iter().enumerate() {
        for position in resolve(table, &rule.columns)? {
            if let Some(&other) = claimed.get(&position) {
                if other != rule_idx {
                    return Err(DashboardErrors::OverlappingRules { position });
                }
            }
            claimed.insert(position, rule_idx);
        }
    }
    for mapping in config.numeric_mappings.iter() {
        resolve(table, &mapping.columns)?;
    }
    for legend in config.legends.iter() {
        if table.position_of(&legend.column).is_none() {
            warn!("validate: no column {:?} for the legend, ignoring it", legend.column);
        }
    }
    let mut names: HashSet<&str> = HashSet::new();
    let mut listed_in: HashMap<usize, &str> = HashMap::new();
    for section in config.sections.iter() {
        if !names.insert(section.name.as_str()) {
            return Err(DashboardErrors::DuplicateSection(section.name.clone()));
        }
        for item in section.items.iter() {
            match item {
                SectionItem::Question(position) if *position >= num_columns => {
                    return Err(DashboardErrors::ColumnOutOfRange {
                        position: *position,
                        num_columns,
                    });
                }
                SectionItem::Question(position) => {
                    match listed_in.get(position) {
                        Some(other) if *other != section.name.as_str() => {
                            warn!(
                                "validate: column {} is listed in the sections {:?} and {:?}",
                                position, other, section.name
                            );
                        }
                        Some(_) => {}
                        None => {
                            listed_in.insert(*position, section.name.as_str());
                        }
                    }
                }
                SectionItem::YesCount { columns, .. } => {
                    resolve(table, columns)?;
                }
            }
        }
    }
    if config.text.max_words == 0 {
        return Err(DashboardErrors::InvalidTextSettings);
    }
    Ok(())
}

/// The positions designated by a selector, checked against the table.
fn resolve(table: &ResponseTable, columns: &ColumnSelector) -> Result<Vec<usize>, DashboardErrors> {
    let num_columns = table.num_columns();
    let positions: Vec<usize> = match columns {
        ColumnSelector::Positions(ps) => ps.clone(),
        ColumnSelector::Range { first, last } if first > last => {
            return Err(DashboardErrors::InvalidRange {
                first: *first,
                last: *last,
            });
        }
        ColumnSelector::Range { first, last } => (*first..=*last).collect(),
        ColumnSelector::Named(names) => {
            let mut res = Vec::new();
            for n in names.iter() {
                let p = table
                    .position_of(n)
                    .ok_or_else(|| DashboardErrors::UnknownColumn(n.clone()))?;
                res.push(p);
            }
            res
        }
    };
    if let Some(&position) = positions.iter().find(|&&p| p >= num_columns) {
        return Err(DashboardErrors::ColumnOutOfRange {
            position,
            num_columns,
        });
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> ResponseTable {
        let h: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let mut builder = Builder::new(&h).unwrap();
        for row in rows {
            let cells: Vec<String> = row.iter().map(|s| s.to_string()).collect();
            builder.add_row(&cells).unwrap();
        }
        builder.build()
    }

    fn survey() -> ResponseTable {
        table(
            &[
                "Id",
                "Professional Group",
                "Do you use the catalogue?",
                "Rate the data quality/accessibility",
                "Which services do you use?",
                "Comments",
                "Suggestions",
            ],
            &[
                &["1", "A", "Yes", "4", "Catalogue, Virtual Labs", "great tools", ""],
                &["2", "B", "No", "3", "Catalogue", "", ""],
                &["3", "Z", "Yes", "", "Virtual Labs, Data Lake", "great access", ""],
                &["4", "", "Yes", "4", "Catalogue, Data Lake", "", ""],
            ],
        )
    }

    fn config() -> DashboardConfig {
        DashboardConfig {
            rules: vec![ColumnRule {
                columns: ColumnSelector::Positions(vec![1]),
                answer_type: AnswerType::SingleSelectCategorical(None),
            }],
            numeric_mappings: vec![NumericMapping {
                columns: ColumnSelector::Range { first: 3, last: 3 },
                scale: Scale::quality(),
            }],
            legends: vec![Legend {
                column: "Professional Group".to_string(),
                codes: vec![
                    ("A".to_string(), "Researcher".to_string()),
                    ("B".to_string(), "Developer".to_string()),
                ],
            }],
            sections: vec![
                Section {
                    name: "About you".to_string(),
                    subtitle: Some("Who answered".to_string()),
                    items: vec![SectionItem::Question(1)],
                },
                Section {
                    name: "Usage".to_string(),
                    subtitle: None,
                    items: vec![
                        SectionItem::Question(2),
                        SectionItem::Question(3),
                        SectionItem::Question(4),
                        SectionItem::YesCount {
                            title: "Users".to_string(),
                            columns: ColumnSelector::Positions(vec![2]),
                        },
                        SectionItem::Question(5),
                        SectionItem::Question(6),
                    ],
                },
            ],
            ..DashboardConfig::default()
        }
    }

    fn chart(panel: &Panel) -> &ChartSpec {
        match &panel.output {
            ChartOutput::Chart(spec) => spec,
            x => panic!("expected a chart, got {:?}", x),
        }
    }

    #[test]
    fn legend_pass_through() {
        let t = survey();
        let c = config();
        let q = t.question(1).unwrap();
        let cells = normalize(&q, c.legend_for(q.name));
        let plain: Vec<Option<&str>> = cells.iter().map(|c| c.as_deref()).collect();
        assert_eq!(
            plain,
            vec![Some("Researcher"), Some("Developer"), Some("Z"), None]
        );
        // The table is untouched.
        assert_eq!(t.question(1).unwrap().cells[0], Some("A".to_string()));
    }

    #[test]
    fn classification_is_total() {
        init();
        let t = survey();
        let c = config();
        let types: Vec<AnswerType> = t
            .questions()
            .map(|q| {
                let cells = normalize(&q, c.legend_for(q.name));
                classify(&q, &cells, &c)
            })
            .collect();
        assert_eq!(
            types,
            vec![
                AnswerType::FreeText,
                AnswerType::SingleSelectCategorical(None),
                AnswerType::YesNo,
                AnswerType::OrdinalScale(Scale::quality()),
                AnswerType::MultiSelect,
                AnswerType::FreeText,
                AnswerType::FreeText,
            ]
        );
    }

    #[test]
    fn only_yes_is_not_yes_no() {
        let t = table(&["Q"], &[&["Yes"], &["Yes"]]);
        let q = t.question(0).unwrap();
        let c = DashboardConfig::default();
        assert_eq!(classify(&q, q.cells, &c), AnswerType::FreeText);
    }

    #[test]
    fn numeric_without_mapping_is_free_text() {
        let t = table(&["Q"], &[&["1"], &["2"]]);
        let q = t.question(0).unwrap();
        assert_eq!(
            classify(&q, q.cells, &DashboardConfig::default()),
            AnswerType::FreeText
        );
    }

    #[test]
    fn first_rule_wins() {
        let t = table(&["Q"], &[&["Yes"], &["No"]]);
        let q = t.question(0).unwrap();
        let c = DashboardConfig {
            rules: vec![
                ColumnRule {
                    columns: ColumnSelector::Named(vec!["Q".to_string()]),
                    answer_type: AnswerType::OrdinalScale(Scale::agreement()),
                },
                ColumnRule {
                    columns: ColumnSelector::Positions(vec![0]),
                    answer_type: AnswerType::FreeText,
                },
            ],
            ..DashboardConfig::default()
        };
        assert_eq!(
            classify(&q, q.cells, &c),
            AnswerType::OrdinalScale(Scale::agreement())
        );
        // ... but such a configuration does not pass validation.
        assert_eq!(
            validate(&t, &c),
            Err(DashboardErrors::OverlappingRules { position: 0 })
        );
    }

    #[test]
    fn render_usage_section() {
        init();
        let d = Dashboard::new(survey(), config()).unwrap();
        let view = d.render_section("Usage").unwrap();
        assert_eq!(view.panels.len(), 6);

        let yes_no = chart(&view.panels[0]);
        assert_eq!(yes_no.kind, ChartKind::Pie);
        assert_eq!(yes_no.labels, vec!["Yes", "No"]);
        assert_eq!(yes_no.values, vec![3, 1]);

        let quality = chart(&view.panels[1]);
        assert_eq!(quality.title, "Rate the data quality<br>accessibility");
        assert_eq!(
            quality.labels,
            vec!["Very Poor", "Poor", "Good", "Very Good", UNKNOWN]
        );
        assert_eq!(quality.values, vec![0, 0, 1, 2, 1]);

        let services = chart(&view.panels[2]);
        assert_eq!(services.kind, ChartKind::Bar);
        assert_eq!(services.labels, vec!["Catalogue", "Data Lake", "Virtual Labs"]);
        assert_eq!(services.values, vec![3, 2, 2]);

        let users = chart(&view.panels[3]);
        assert_eq!(view.panels[3].position, None);
        assert_eq!(users.labels, vec!["Do you use the catalogue?"]);
        assert_eq!(users.values, vec![3]);

        let comments = chart(&view.panels[4]);
        assert_eq!(comments.kind, ChartKind::WordCloud);
        assert_eq!(comments.labels, vec!["great", "access", "tools"]);
        assert_eq!(comments.values, vec![2, 1, 1]);

        assert_eq!(
            view.panels[5].output,
            ChartOutput::Placeholder {
                title: "Suggestions".to_string(),
                message: NO_RESPONSES_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn render_is_idempotent() {
        let d = Dashboard::new(survey(), config()).unwrap();
        for name in d.section_names() {
            assert_eq!(d.render_section(name), d.render_section(name));
        }
    }

    #[test]
    fn section_one_with_no_answer() {
        let d = Dashboard::new(survey(), config()).unwrap();
        let view = d.render_section("About you").unwrap();
        assert_eq!(view.subtitle.as_deref(), Some("Who answered"));
        let spec = chart(&view.panels[0]);
        assert_eq!(spec.labels, vec!["Researcher", "Developer", "Z", NO_ANSWER]);
        assert_eq!(spec.values, vec![1, 1, 1, 1]);
        assert_eq!(spec.colors[3], NEUTRAL_COLOR);
        assert!(spec.colors.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn default_section_lists_every_column() {
        let d = Dashboard::new(survey(), DashboardConfig::default()).unwrap();
        assert_eq!(d.section_names(), vec![ALL_QUESTIONS]);
        let view = d.render_section(ALL_QUESTIONS).unwrap();
        assert_eq!(view.panels.len(), 7);
    }

    #[test]
    fn unknown_section() {
        let d = Dashboard::new(survey(), config()).unwrap();
        assert_eq!(
            d.render_section("Section 9"),
            Err(DashboardErrors::UnknownSection("Section 9".to_string()))
        );
    }

    #[test]
    fn overlapping_sections_are_rendered() {
        init();
        let mut c = config();
        c.sections[1].items.push(SectionItem::Question(1));
        let d = Dashboard::new(survey(), c).unwrap();
        let about = d.render_section("About you").unwrap();
        let usage = d.render_section("Usage").unwrap();
        assert_eq!(about.panels[0].position, Some(1));
        assert_eq!(usage.panels.last().unwrap().position, Some(1));
        assert_eq!(about.panels[0], *usage.panels.last().unwrap());
    }

    #[test]
    fn validation_errors() {
        let t = survey();
        let mut c = config();
        c.sections[0].items.push(SectionItem::Question(12));
        assert_eq!(
            Dashboard::new(t.clone(), c).err(),
            Some(DashboardErrors::ColumnOutOfRange {
                position: 12,
                num_columns: 7
            })
        );

        let mut c = config();
        c.rules.push(ColumnRule {
            columns: ColumnSelector::Named(vec!["Nope".to_string()]),
            answer_type: AnswerType::FreeText,
        });
        assert_eq!(
            validate(&t, &c),
            Err(DashboardErrors::UnknownColumn("Nope".to_string()))
        );

        let mut c = config();
        c.numeric_mappings[0].columns = ColumnSelector::Range { first: 4, last: 2 };
        assert_eq!(
            validate(&t, &c),
            Err(DashboardErrors::InvalidRange { first: 4, last: 2 })
        );

        let mut c = config();
        c.sections.push(c.sections[0].clone());
        assert_eq!(
            validate(&t, &c),
            Err(DashboardErrors::DuplicateSection("About you".to_string()))
        );

        let mut c = config();
        c.text.max_words = 0;
        assert_eq!(validate(&t, &c), Err(DashboardErrors::InvalidTextSettings));
    }
}
