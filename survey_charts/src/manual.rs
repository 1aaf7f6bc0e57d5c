/*!

This is the long-form manual for `survey_charts` and `surveydash`.

## Input formats

The following formats are supported:
* `csv` Delimited text, with the questions in the first row (the default delimiter is `;`)
* `msforms` Export of Microsoft Forms or Google Forms in Excel (.xlsx) format

Each row after the header holds the answers of one respondent. Blank cells are
missing answers.

## Answer types

Every question (column) gets exactly one answer type:

| type           | chart      | counting                                           |
|----------------|------------|----------------------------------------------------|
| `singleSelect` | pie        | one count per distinct answer, blanks as `No Answer` |
| `ordinal`      | pie        | every rank of the scale, zero counts included      |
| `yesNo`        | pie        | `Yes` then `No`                                    |
| `multiSelect`  | bar        | each selected option counts once per respondent    |
| `freeText`     | word cloud | word frequencies, stop words removed               |

The declared rules are tried first, in order. A column that no rule selects is
classified from its answers:
1. exactly the answers `Yes` and `No`: `yesNo`
2. the multi-select delimiter in most of the answers: `multiSelect`
3. numeric codes, with a numeric mapping configured for the column: `ordinal`
4. anything else: `freeText`

Ordinal answers that are missing or outside of the scale are counted in a
trailing `Unknown` slice. It only appears when it is not empty.

A column without any answer is shown as a placeholder instead of a chart.

## Scales

Three scales are built in:
* `quality`: `Very Poor`, `Poor`, `Good`, `Very Good`, also coded `1` to `4`
* `agreement`: `I fully disagree`, `I slightly disagree`, `I slightly agree`, `I fully agree`
* `interest`: `Not interested`, `Slightly interested`, `Interested`, `Very interested`

Other scales can be declared in the configuration.

## Configuration file

The configuration is a JSON document. All the fields are optional.

```text
{
  "outputSettings": { "dashboardTitle": "...", "asOfDate": "2024-11-15" },
  "inputSource": { "provider": "csv", "filePath": "answers.csv", "delimiter": ";" },
  "legends": [ { "column": "Professional Group", "codes": { "A": "Researcher" } } ],
  "scales": [ { "name": "frequency", "order": ["Never", "Often"],
                "colors": ["#d73027", "#1a9850"], "valueMapping": { "0": "Never" } } ],
  "rules": [ { "columns": [1, "C", "D-F"], "columnNames": ["..."],
               "answerType": "ordinal", "scale": "frequency" } ],
  "numericMappings": [ { "columns": ["4-11"], "scale": "quality" } ],
  "sections": [ { "name": "Usage", "subtitle": "...", "columns": ["D-L"],
                  "yesCount": { "title": "...", "columns": [7, 8], "insertAt": 0 } } ],
  "multiSelect": { "delimiter": ",", "sortOrder": "alphabetical" },
  "text": { "stopWords": ["..."], "useDefaultStopWords": true, "maxWords": 50 },
  "charts": { "horizontalBarMinOptions": 6, "horizontalBarMinLabelLength": 30, "lineBreak": "<br>" }
}
```

Columns are referred to by their 0-based position, by their Excel name (`A` is
the first column, `AA` the 27th) or by an inclusive range of either (`3-11`,
`D-L`). The `filePath` is relative to the configuration file.

Legends replace raw codes by labels. Codes that a legend does not list are
kept as they are.

A `yesCount` adds to its section a bar chart with the number of `Yes` answers
of each of its columns.

Without sections, all the questions are shown in a single section called
`All questions`.

`sortOrder` is one of `alphabetical`, `reverseAlphabetical` or `count`.

## Output

`surveydash` writes a single JSON document: the `config` (title, date,
number of respondents and questions) and the rendered `sections`. Each panel of
a section has the position and text of its question, its answer type and a
`chart`: `kind` (`pie`, `bar`, `wordCloud` or `placeholder`), `title`, `labels`,
`values`, `colors` and `orientation`.

Titles have their `/` replaced by the line break (`<br>` by default). Bar
charts are horizontal from 6 options on, or when a label has 30 characters or
more.

*/
