use std::borrow::Cow;

use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, one_of},
    combinator::{eof, rest},
    error::ParseError,
    sequence::{delimited, preceded, terminated},
    IResult, Parser,
};

use crate::{
    data::{LineKind, Run, Tx},
    util::{strip_bold, BOLD},
};

/// Deepest heading level a document can express
pub const MAX_HEADING: usize = 6;

type NomError<'source> = nom::error::Error<&'source str>;

fn whitespace1<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    take_while1(char::is_whitespace)(input)
}

/// Parses heading
///
/// - One or more '#', followed by whitespace or the end of the line
/// - Levels deeper than [`MAX_HEADING`] are clamped
/// - Closing hashes (`## Title ##`) and bold delimiters are dropped from the text
fn heading<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, LineKind<'source>, E> {
    let (rest, (hashes, _)) = take_while1::<_, _, E>(|c: char| c == '#')
        .and(alt((whitespace1::<E>, eof::<_, E>)))
        .parse(input)?;
    let level = hashes.len().min(MAX_HEADING) as u8;
    let text = rest.trim().trim_end_matches('#').trim_end();
    Ok((
        "",
        LineKind::Heading {
            level,
            text: strip_bold(text),
        },
    ))
}

/// True for `|---|:--:|` and the like
fn is_separator(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '-' | ':' | '|') || c.is_whitespace())
}

/// Splits row body on unescaped pipes
fn split_cells(body: &str) -> impl Iterator<Item = &str> {
    let pipes = body.char_indices().filter(|(_, c)| c == &'|');
    let unescaped = pipes.filter(|(ind, _)| !body[..*ind].ends_with('\\'));
    let mut last = 0;
    unescaped
        .map(|(ind, _)| ind)
        .chain(std::iter::once(body.len()))
        .map(move |ind| {
            let cell = &body[last..ind];
            last = ind + 1;
            cell
        })
}

/// Cells are plain text: bold delimiters go, escaped pipes become pipes
fn clean_cell(cell: &str) -> Tx<'_> {
    let cell = strip_bold(cell.trim());
    if cell.contains("\\|") {
        Cow::Owned(cell.replace("\\|", "|"))
    } else {
        cell
    }
}

/// Parses table row
///
/// - Always starts with '|'
/// - A row of separator characters only is reported as [`LineKind::TableSeparator`]
/// - Outer pipes are optional on the right; every unescaped pipe in between divides cells
fn table_row<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, LineKind<'source>, E> {
    let (body, _) = char::<_, E>('|')(input)?;
    if is_separator(body) {
        return Ok(("", LineKind::TableSeparator));
    }
    let body = match body.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => body,
    };
    let cells = split_cells(body).map(clean_cell).collect();
    Ok(("", LineKind::TableRow(cells)))
}

/// Parses bullet marker (`* ` or `- `), returning the item text
fn bullet<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    preceded(terminated(one_of("*-"), whitespace1), rest)(input)
}

fn paragraph(line: &str) -> LineKind<'_> {
    let (text, bullet) = match bullet::<NomError>(line) {
        Ok((_, item)) => (item, true),
        Err(_) => (line, false),
    };
    LineKind::Paragraph {
        runs: resolve_emphasis(text),
        bullet,
    }
}

/// Classifies a single trimmed line
///
/// Never fails: anything that is neither a heading nor a table row is a paragraph.
pub fn classify(line: &str) -> LineKind<'_> {
    alt((heading::<NomError>, table_row))
        .parse(line)
        .map(|(_, kind)| kind)
        .unwrap_or_else(|_| paragraph(line))
}

/// Parses `**span**`, yielding span content
fn bold_span<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    delimited(tag(BOLD), take_until(BOLD), tag(BOLD))(input)
}

/// Appends a run, skipping empty ones and merging it into a preceding run of the same style
fn push_run<'source>(runs: &mut Vec<Run<'source>>, text: &'source str, bold: bool) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.bold == bold => last.text.to_mut().push_str(text),
        _ => runs.push(Run {
            text: Cow::Borrowed(text),
            bold,
        }),
    }
}

/// Splits paragraph text into plain and bold runs
///
/// Delimiters are paired left to right, each opening `**` with the nearest following one.
/// A delimiter without a pair is kept literally, so concatenated run texts always reproduce
/// the input minus the paired delimiters.
pub fn resolve_emphasis(text: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut input = text;
    loop {
        // everything up to the next delimiter is plain
        let Ok((at_marker, plain)) = take_until::<_, _, NomError>(BOLD)(input)
        else {
            push_run(&mut runs, input, false);
            break;
        };
        push_run(&mut runs, plain, false);
        match bold_span::<NomError>(at_marker) {
            Ok((after, bold)) => {
                push_run(&mut runs, bold, true);
                input = after;
            }
            Err(_) => {
                debug!("Unmatched bold delimiter kept as text: {at_marker:?}");
                push_run(&mut runs, at_marker, false);
                break;
            }
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test {
        {$name:ident, $function:expr, $input:literal, e: $expected:expr} => {
            #[test]
            fn $name() {
                // arrange

                // act
                let result = $function($input);

                // assert
                let expected = $expected;
                if result != expected {
                    panic!("Did not produce expected result. Structure comparison:\n\tExpected:{:#?}\n\n\tActual:{:#?}", expected, result);
                }
            }
        };
        {$name:ident, $function:expr, $input:literal, p: $expected:pat} => {
            #[test]
            fn $name() {
                // act
                let result = $function($input);

                // assert
                if !matches!(result, $expected) {
                    panic!("{}: {:?}", "Did not produce complying result:", result);
                }
            }
        };
    }

    macro_rules! head {
        ($level:literal, $text:literal) => {
            LineKind::Heading {
                level: $level,
                text: $text.into(),
            }
        };
    }

    macro_rules! row {
        [$($cell:literal), *] => {
            LineKind::TableRow(vec![$($cell.into()), *])
        };
    }

    macro_rules! para {
        [bullet; $($text:literal: $bold:literal), *] => {
            LineKind::Paragraph {
                runs: vec![$(Run { text: $text.into(), bold: $bold }), *],
                bullet: true,
            }
        };
        [$($text:literal: $bold:literal), *] => {
            LineKind::Paragraph {
                runs: vec![$(Run { text: $text.into(), bold: $bold }), *],
                bullet: false,
            }
        };
    }

    macro_rules! runs {
        [$($text:literal: $bold:literal), *] => {
            vec![$(Run { text: Cow::from($text), bold: $bold }), *]
        };
    }

    // headings
    test! {heading1, classify, "# 審題報告", e: head!(1, "審題報告")}
    test! {heading3, classify, "### Step 1: Scope", e: head!(3, "Step 1: Scope")}
    test! {heading_bold, classify, "## **總結**", e: head!(2, "總結")}
    test! {heading_closing, classify, "## Title ##", e: head!(2, "Title")}
    test! {heading_only_hashes, classify, "###", e: head!(3, "")}
    test! {heading_clamped, classify, "######### deep", e: head!(6, "deep")}
    test! {heading_no_space, classify, "#hashtag", e: para!["#hashtag": false]}

    // tables
    test! {row_plain, classify, "| 題號 | 問題 | 建議 |", e: row!["題號", "問題", "建議"]}
    test! {row_no_trailing_pipe, classify, "| a | b", e: row!["a", "b"]}
    test! {row_bold_stripped, classify, "| **Q1** | ok |", e: row!["Q1", "ok"]}
    test! {row_empty_cells, classify, "| a || c |", e: row!["a", "", "c"]}
    test! {row_escaped_pipe, classify, r"| a \| b | c |", e: row!["a | b", "c"]}
    test! {separator_plain, classify, "|---|---|", e: LineKind::TableSeparator}
    test! {separator_aligned, classify, "| :--- | :---: | ---: |", e: LineKind::TableSeparator}
    test! {separator_pipe_only, classify, "|", e: LineKind::TableSeparator}

    // paragraphs
    test! {para_plain, classify, "No issues found.", e: para!["No issues found.": false]}
    test! {para_bullet_star, classify, "* 第3題 **題意不清**", e: para![bullet; "第3題 ": false, "題意不清": true]}
    test! {para_bullet_dash, classify, "- item", e: para![bullet; "item": false]}
    test! {para_bold_start, classify, "**注意** 這裡", e: para!["注意": true, " 這裡": false]}
    test! {para_rule, classify, "---", e: para!["---": false]}
    test! {para_numbered, classify, "1. first", e: para!["1. first": false]}
    test! {para_long_row_is_total, classify, "||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||x", p: LineKind::TableRow(_)}

    // emphasis
    test! {emphasis_plain, resolve_emphasis, "just text", e: runs!["just text": false]}
    test! {emphasis_pairs, resolve_emphasis, "a **b** c **d** e", e: runs!["a ": false, "b": true, " c ": false, "d": true, " e": false]}
    test! {emphasis_unmatched, resolve_emphasis, "a **b c", e: runs!["a **b c": false]}
    test! {emphasis_odd, resolve_emphasis, "**a** b **c", e: runs!["a": true, " b **c": false]}
    test! {emphasis_empty_span, resolve_emphasis, "x****y", e: runs!["xy": false]}
    test! {emphasis_whole, resolve_emphasis, "**all**", e: runs!["all": true]}
    test! {emphasis_empty, resolve_emphasis, "", e: runs![]}

    #[test]
    fn emphasis_concatenation_roundtrip() {
        for line in [
            "plain text",
            "標點，符號。",
            "a * b * c",
            "⚠️ 第 3 題題意不清",
            "trailing space ",
        ] {
            // act
            let runs = resolve_emphasis(line);

            // assert
            let joined: String = runs.iter().map(|run| run.text.as_ref()).collect();
            assert_eq!(joined, line);
            assert!(runs.iter().all(|run| !run.bold));
        }
    }

    #[test]
    fn emphasis_unmatched_keeps_delimiters() {
        // act
        let runs = resolve_emphasis("a **b c");

        // assert
        let joined: String = runs.iter().map(|run| run.text.as_ref()).collect();
        assert_eq!(joined, "a **b c");
    }
}
