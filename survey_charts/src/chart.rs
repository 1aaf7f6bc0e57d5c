use crate::config::*;

/// The color policy used when nothing more specific is configured for a question.
pub fn default_color_policy(answer_type: &AnswerType, aggregate: &AggregateResult) -> ColorPolicy {
    match answer_type {
        AnswerType::YesNo => ColorPolicy::yes_no(),
        AnswerType::OrdinalScale(scale) => scale.color_policy(),
        AnswerType::SingleSelectCategorical(Some(order)) => {
            ColorPolicy::sequential(order.labels(), &BLUES_PALETTE)
        }
        AnswerType::SingleSelectCategorical(None) => {
            ColorPolicy::sequential(&aggregate.labels(), &BLUES_PALETTE)
        }
        AnswerType::MultiSelect | AnswerType::FreeText => ColorPolicy::by_magnitude(aggregate),
    }
}

/// Builds the chart for an aggregated question.
///
/// Every label gets a color: the labels unknown to the policy get its neutral color.
/// Zero counts are kept so that the legend of an ordinal scale is always complete.
pub fn build_chart(
    aggregate: &AggregateResult,
    answer_type: &AnswerType,
    colors: &ColorPolicy,
    title: &str,
    settings: &ChartSettings,
) -> ChartSpec {
    let labels = aggregate.labels();
    let kind = match answer_type {
        AnswerType::SingleSelectCategorical(_) | AnswerType::OrdinalScale(_) | AnswerType::YesNo => {
            ChartKind::Pie
        }
        AnswerType::MultiSelect => ChartKind::Bar,
        AnswerType::FreeText => ChartKind::WordCloud,
    };
    let orientation = match kind {
        ChartKind::Bar => bar_orientation(&labels, settings),
        _ => Orientation::Vertical,
    };
    ChartSpec {
        kind,
        title: format_title(title, &settings.line_break),
        colors: labels
            .iter()
            .map(|l| colors.color_for(l).to_string())
            .collect(),
        labels,
        values: aggregate.values(),
        orientation,
    }
}

/// Bar chart of the number of affirmative answers, one bar per column.
pub fn build_yes_count_chart(
    aggregate: &AggregateResult,
    title: &str,
    settings: &ChartSettings,
) -> ChartSpec {
    let labels: Vec<String> = aggregate
        .labels()
        .iter()
        .map(|l| format_title(l, &settings.line_break))
        .collect();
    let orientation = bar_orientation(&aggregate.labels(), settings);
    ChartSpec {
        kind: ChartKind::Bar,
        title: format_title(title, &settings.line_break),
        colors: vec![YES_COLOR.to_string(); labels.len()],
        labels,
        values: aggregate.values(),
        orientation,
    }
}

pub fn format_title(title: &str, line_break: &str) -> String {
    title.replace('/', line_break)
}

fn bar_orientation(labels: &[String], settings: &ChartSettings) -> Orientation {
    let long_labels = labels
        .iter()
        .any(|l| l.chars().count() >= settings.horizontal_bar_min_label_length);
    if labels.len() >= settings.horizontal_bar_min_options || long_labels {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(raw: &[(&str, u64)]) -> AggregateResult {
        AggregateResult::new(raw.iter().map(|(l, c)| (l.to_string(), *c)).collect())
    }

    #[test]
    fn ordinal_pie_keeps_zero_slices() {
        let a = agg(&[("Very Poor", 0), ("Poor", 0), ("Good", 4), ("Very Good", 0)]);
        let t = AnswerType::OrdinalScale(Scale::quality());
        let spec = build_chart(
            &a,
            &t,
            &default_color_policy(&t, &a),
            "Quality of the data",
            &ChartSettings::default(),
        );
        assert_eq!(spec.kind, ChartKind::Pie);
        assert_eq!(spec.values, vec![0, 0, 4, 0]);
        assert_eq!(spec.labels.len(), 4);
        assert_eq!(spec.colors[0], DIVERGING_PALETTE[0]);
        assert_eq!(spec.colors[3], DIVERGING_PALETTE[8]);
    }

    #[test]
    fn every_label_has_a_color() {
        let a = agg(&[("Yes", 2), ("No", 1), ("Maybe", 1), (NO_ANSWER, 3)]);
        let spec = build_chart(
            &a,
            &AnswerType::YesNo,
            &ColorPolicy::yes_no(),
            "Q",
            &ChartSettings::default(),
        );
        assert_eq!(
            spec.colors,
            vec![YES_COLOR, NO_COLOR, NEUTRAL_COLOR, NEUTRAL_COLOR]
        );
    }

    #[test]
    fn reserved_labels_are_neutral() {
        let a = agg(&[("I fully agree", 1), (UNKNOWN, 1)]);
        let policy = ColorPolicy::new(&[(UNKNOWN.to_string(), "#000000".to_string())]);
        let spec = build_chart(
            &a,
            &AnswerType::SingleSelectCategorical(None),
            &policy,
            "Q",
            &ChartSettings::default(),
        );
        assert_eq!(spec.colors, vec![NEUTRAL_COLOR, NEUTRAL_COLOR]);
    }

    #[test]
    fn multi_select_bars() {
        let settings = ChartSettings::default();
        let short = agg(&[("A", 1), ("B", 2), ("C", 1)]);
        let spec = build_chart(
            &short,
            &AnswerType::MultiSelect,
            &ColorPolicy::by_magnitude(&short),
            "Q",
            &settings,
        );
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(spec.orientation, Orientation::Vertical);
        assert_eq!(spec.colors[1], DIVERGING_PALETTE[8]);

        let long = agg(&[("Search and discovery of marine datasets", 3), ("B", 1)]);
        let spec = build_chart(
            &long,
            &AnswerType::MultiSelect,
            &ColorPolicy::by_magnitude(&long),
            "Q",
            &settings,
        );
        assert_eq!(spec.orientation, Orientation::Horizontal);
    }

    #[test]
    fn titles_break_on_slash() {
        let spec = build_chart(
            &agg(&[("x", 1)]),
            &AnswerType::FreeText,
            &ColorPolicy::new(&[]),
            "Strengths/weaknesses/opportunities",
            &ChartSettings::default(),
        );
        assert_eq!(spec.title, "Strengths<br>weaknesses<br>opportunities");
        assert_eq!(spec.kind, ChartKind::WordCloud);
    }

    #[test]
    fn ramp_spans_the_palette() {
        let policy = ColorPolicy::ramp(&CategoryOrder::from_strs(&["a", "b", "c"]));
        assert_eq!(policy.color_for("a"), DIVERGING_PALETTE[0]);
        assert_eq!(policy.color_for("b"), DIVERGING_PALETTE[4]);
        assert_eq!(policy.color_for("c"), DIVERGING_PALETTE[8]);
        assert_eq!(policy.color_for("d"), NEUTRAL_COLOR);
    }
}
