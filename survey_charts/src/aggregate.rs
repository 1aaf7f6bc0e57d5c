use log::debug;

use std::collections::{BTreeMap, HashMap};

use crate::config::*;

/// Counts the answers of one column, according to its answer type.
///
/// The cells are the normalized answers of the column, `None` being a missing answer.
/// A column without any answer is reported as [`Aggregation::NoResponses`],
/// whatever its type.
pub fn aggregate<S: AsRef<str>>(
    cells: &[Option<S>],
    answer_type: &AnswerType,
    config: &DashboardConfig,
) -> Aggregation {
    let num_answered = answered(cells).count();
    if num_answered == 0 {
        debug!("aggregate: no answer in {} cells", cells.len());
        return Aggregation::NoResponses;
    }
    let res = match answer_type {
        AnswerType::SingleSelectCategorical(order) => tally_categorical(cells, order.as_ref()),
        AnswerType::YesNo => {
            tally_categorical(cells, Some(&CategoryOrder::from_strs(&[YES, NO])))
        }
        AnswerType::OrdinalScale(scale) => tally_ordinal(cells, scale),
        AnswerType::MultiSelect => tally_multi_select(cells, &config.multi_select),
        AnswerType::FreeText => tally_tokens(cells, &config.text),
    };
    debug!(
        "aggregate: type {} answered {} tally {:?}",
        answer_type.name(),
        num_answered,
        res.entries()
    );
    if res.is_empty() {
        Aggregation::NoResponses
    } else {
        Aggregation::Tally(res)
    }
}

fn answered<'a, S: AsRef<str>>(cells: &'a [Option<S>]) -> impl Iterator<Item = &'a str> {
    cells
        .iter()
        .filter_map(|c| c.as_ref().map(|s| s.as_ref().trim()))
        .filter(|s| !s.is_empty())
}

/// Counts in first-seen order. The labels of the order, if any, come first
/// (including those that were never chosen). Missing answers are counted last.
fn tally_categorical<S: AsRef<str>>(
    cells: &[Option<S>],
    order: Option<&CategoryOrder>,
) -> AggregateResult {
    let mut entries: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    if let Some(o) = order {
        for label in o.labels() {
            index.insert(label.clone(), entries.len());
            entries.push((label.clone(), 0));
        }
    }
    let mut missing: u64 = 0;
    for cell in cells.iter() {
        match cell.as_ref().map(|s| s.as_ref().trim()) {
            Some(s) if !s.is_empty() => {
                if let Some(&idx) = index.get(s) {
                    entries[idx].1 += 1;
                } else {
                    index.insert(s.to_string(), entries.len());
                    entries.push((s.to_string(), 1));
                }
            }
            _ => {
                missing += 1;
            }
        }
    }
    if missing > 0 {
        entries.push((NO_ANSWER.to_string(), missing));
    }
    AggregateResult::new(entries)
}

/// Counts against the full scale. Every rank is reported, zero-filled.
/// Missing answers and answers outside of the scale go to the trailing
/// [`UNKNOWN`] bucket, which only appears when it is not empty.
fn tally_ordinal<S: AsRef<str>>(cells: &[Option<S>], scale: &Scale) -> AggregateResult {
    let mut counts: Vec<u64> = vec![0; scale.order.len()];
    let mut unknown: u64 = 0;
    for cell in cells.iter() {
        match cell.as_ref().and_then(|s| scale.rank_of(s.as_ref())) {
            Some(rank) => counts[rank] += 1,
            None => unknown += 1,
        }
    }
    let mut entries: Vec<(String, u64)> = scale
        .order
        .labels()
        .iter()
        .cloned()
        .zip(counts)
        .collect();
    if unknown > 0 {
        debug!(
            "tally_ordinal: scale {}: {} answers outside of the scale",
            scale.name, unknown
        );
        entries.push((UNKNOWN.to_string(), unknown));
    }
    AggregateResult::new(entries)
}

/// Multi-hot count: every option chosen by a respondent counts once.
fn tally_multi_select<S: AsRef<str>>(
    cells: &[Option<S>],
    settings: &MultiSelectSettings,
) -> AggregateResult {
    let mut tally: BTreeMap<String, u64> = BTreeMap::new();
    for cell in answered(cells) {
        for token in cell
            .split(settings.delimiter)
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            *tally.entry(token.to_string()).or_insert(0) += 1;
        }
    }
    let mut entries: Vec<(String, u64)> = tally.into_iter().collect();
    match settings.sort_order {
        SortOrder::Alphabetical => {}
        SortOrder::ReverseAlphabetical => entries.reverse(),
        SortOrder::ByCount => entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))),
    }
    AggregateResult::new(entries)
}

/// Word frequencies of the free text answers, most frequent first.
///
/// Tokens are split on whitespace and stripped of surrounding punctuation.
/// Equal counts are ordered by token so that the output is reproducible.
fn tally_tokens<S: AsRef<str>>(cells: &[Option<S>], settings: &TextSettings) -> AggregateResult {
    let text: String = answered(cells).collect::<Vec<&str>>().join(" ");
    let mut tally: HashMap<&str, u64> = HashMap::new();
    for raw in text.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if token.is_empty() || settings.stop_words.contains(token) {
            continue;
        }
        *tally.entry(token).or_insert(0) += 1;
    }
    let mut entries: Vec<(String, u64)> = tally
        .into_iter()
        .map(|(t, c)| (t.to_string(), c))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(settings.max_words);
    AggregateResult::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(raw: &[&str]) -> Vec<Option<String>> {
        raw.iter()
            .map(|s| {
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            })
            .collect()
    }

    fn tally(agg: Aggregation) -> Vec<(String, u64)> {
        match agg {
            Aggregation::Tally(res) => res.entries().to_vec(),
            Aggregation::NoResponses => panic!("expected a tally"),
        }
    }

    fn pairs(raw: &[(&str, u64)]) -> Vec<(String, u64)> {
        raw.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[test]
    fn single_select_keeps_first_seen_order() {
        let config = DashboardConfig::default();
        let res = aggregate(
            &cells(&["Academia", "Industry", "", "Academia"]),
            &AnswerType::SingleSelectCategorical(None),
            &config,
        );
        assert_eq!(
            tally(res),
            pairs(&[("Academia", 2), ("Industry", 1), (NO_ANSWER, 1)])
        );
    }

    #[test]
    fn single_select_with_order() {
        let config = DashboardConfig::default();
        let order = CategoryOrder::from_strs(&["Small", "Medium", "Large"]);
        let res = aggregate(
            &cells(&["Large", "Other", "Small"]),
            &AnswerType::SingleSelectCategorical(Some(order)),
            &config,
        );
        assert_eq!(
            tally(res),
            pairs(&[("Small", 1), ("Medium", 0), ("Large", 1), ("Other", 1)])
        );
    }

    #[test]
    fn yes_no_is_ordered() {
        let config = DashboardConfig::default();
        let res = aggregate(&cells(&["No", "Yes", "No"]), &AnswerType::YesNo, &config);
        assert_eq!(tally(res), pairs(&[("Yes", 1), ("No", 2)]));
    }

    #[test]
    fn ordinal_zero_fill() {
        let config = DashboardConfig::default();
        let res = aggregate(
            &cells(&["Good", "Good", "Good"]),
            &AnswerType::OrdinalScale(Scale::quality()),
            &config,
        );
        assert_eq!(
            tally(res),
            pairs(&[("Very Poor", 0), ("Poor", 0), ("Good", 3), ("Very Good", 0)])
        );
    }

    #[test]
    fn ordinal_value_mapping() {
        let config = DashboardConfig::default();
        let res = aggregate(
            &cells(&["4", "4.0", "1", "7", ""]),
            &AnswerType::OrdinalScale(Scale::quality()),
            &config,
        );
        assert_eq!(
            tally(res),
            pairs(&[
                ("Very Poor", 1),
                ("Poor", 0),
                ("Good", 0),
                ("Very Good", 2),
                (UNKNOWN, 2)
            ])
        );
    }

    #[test]
    fn multi_select_is_multi_hot() {
        let config = DashboardConfig::default();
        let raw = cells(&["A,B", "B", "C", ""]);
        let agg = aggregate(&raw, &AnswerType::MultiSelect, &config);
        let res = tally(agg.clone());
        assert_eq!(res, pairs(&[("A", 1), ("B", 2), ("C", 1)]));
        // More selections than respondents.
        match agg {
            Aggregation::Tally(t) => assert_eq!(t.total(), 4),
            x => panic!("unexpected aggregation {:?}", x),
        }
    }

    #[test]
    fn multi_select_sort_orders() {
        let mut config = DashboardConfig::default();
        let raw = cells(&["Catalogue ; Virtual Labs", "Virtual Labs", "Analytics;Virtual Labs"]);
        config.multi_select = MultiSelectSettings {
            delimiter: ';',
            sort_order: SortOrder::ReverseAlphabetical,
        };
        let res = tally(aggregate(&raw, &AnswerType::MultiSelect, &config));
        assert_eq!(
            res,
            pairs(&[("Virtual Labs", 3), ("Catalogue", 1), ("Analytics", 1)])
        );
        config.multi_select.sort_order = SortOrder::ByCount;
        let res = tally(aggregate(&raw, &AnswerType::MultiSelect, &config));
        assert_eq!(
            res,
            pairs(&[("Virtual Labs", 3), ("Analytics", 1), ("Catalogue", 1)])
        );
    }

    #[test]
    fn multi_select_only_delimiters() {
        let config = DashboardConfig::default();
        let res = aggregate(&cells(&[",", " , "]), &AnswerType::MultiSelect, &config);
        assert_eq!(res, Aggregation::NoResponses);
    }

    #[test]
    fn free_text_frequencies() {
        let mut config = DashboardConfig::default();
        config.text.stop_words = ["and", "the"].iter().map(|s| s.to_string()).collect();
        config.text.max_words = 3;
        let raw = cells(&[
            "Faster access, and the catalogue.",
            "",
            "catalogue search and faster access",
            "Search!",
        ]);
        let res = tally(aggregate(&raw, &AnswerType::FreeText, &config));
        assert_eq!(
            res,
            pairs(&[("access", 2), ("catalogue", 2), ("Faster", 1)])
        );
    }

    #[test]
    fn free_text_stop_words_are_case_sensitive() {
        let mut config = DashboardConfig::default();
        config.text.stop_words = ["data"].iter().map(|s| s.to_string()).collect();
        let res = tally(aggregate(
            &cells(&["data Data data"]),
            &AnswerType::FreeText,
            &config,
        ));
        assert_eq!(res, pairs(&[("Data", 1)]));
    }

    #[test]
    fn empty_column_placeholder() {
        let config = DashboardConfig::default();
        let raw = cells(&["", "", ""]);
        for t in [
            AnswerType::FreeText,
            AnswerType::MultiSelect,
            AnswerType::YesNo,
            AnswerType::SingleSelectCategorical(None),
            AnswerType::OrdinalScale(Scale::agreement()),
        ] {
            assert_eq!(aggregate(&raw, &t, &config), Aggregation::NoResponses);
        }
    }

    #[test]
    fn only_stop_words() {
        let config = DashboardConfig::default();
        let res = aggregate(&cells(&["the and", "of"]), &AnswerType::FreeText, &config);
        assert_eq!(res, Aggregation::NoResponses);
    }
}
