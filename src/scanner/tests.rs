use super::*;

fn scan(text: &str) -> ScanOutput {
    let resolver = Resolver::new();
    let scanner = CitationScanner::new(&resolver).expect("scanner should compile");
    scanner.scan(&SourceText::new(text))
}

fn refs(output: &ScanOutput) -> Vec<(&'static str, u32, Option<u32>, Option<u32>)> {
    output
        .citations
        .iter()
        .map(|c| (c.book.slug, c.chapter, c.verse_start, c.verse_end))
        .collect()
}

#[test]
fn abbreviated_book_with_roman_chapter_and_single_verse() {
    let output = scan("Rom. viii. 13 saith that we must mortify the deeds of the body.");
    assert_eq!(refs(&output), vec![("romans", 8, Some(13), None)]);

    let citation = &output.citations[0];
    assert_eq!(citation.book.name, "Romans");
    assert_eq!(citation.offset, 0);
    assert_eq!(citation.end_offset, 13);
    assert_eq!(citation.form, BookForm::Abbreviation);
    assert_eq!(citation.clause, VerseClause::Single);
}

#[test]
fn chapter_only_citation_has_no_verses() {
    let output = scan("Ps. xxvii.");
    assert_eq!(refs(&output), vec![("psalms", 27, None, None)]);
    assert_eq!(output.citations[0].clause, VerseClause::ChapterOnly);
}

#[test]
fn verse_range_yields_one_occurrence_with_both_bounds() {
    let output = scan("Rom. viii. 13-17");
    assert_eq!(refs(&output), vec![("romans", 8, Some(13), Some(17))]);
    assert_eq!(output.citations[0].clause, VerseClause::Range);

    let en_dash = scan("see Rom. viii. 13 – 17 there");
    assert_eq!(refs(&en_dash), vec![("romans", 8, Some(13), Some(17))]);
}

#[test]
fn verse_list_yields_one_occurrence_per_verse() {
    let output = scan("Rom. x. 3, 4");
    assert_eq!(
        refs(&output),
        vec![("romans", 10, Some(3), None), ("romans", 10, Some(4), None)]
    );
    assert!(output.citations.iter().all(|c| c.offset == 0));
    assert!(output.citations.iter().all(|c| c.clause == VerseClause::List));
}

#[test]
fn verse_list_elements_may_be_ranges() {
    let output = scan("as Gen. i. 1-3, 5 declares");
    assert_eq!(
        refs(&output),
        vec![("genesis", 1, Some(1), Some(3)), ("genesis", 1, Some(5), None)]
    );
}

#[test]
fn equal_range_bounds_collapse_to_single_verse() {
    let output = scan("Heb. xii. 14-14");
    assert_eq!(refs(&output), vec![("hebrews", 12, Some(14), None)]);
}

#[test]
fn full_names_arabic_numbers_and_numbered_books() {
    let output = scan("Compare Romans 8:28 with 1 Cor. 15:10 and 1 John iv. 7.");
    assert_eq!(
        refs(&output),
        vec![
            ("romans", 8, Some(28), None),
            ("1-corinthians", 15, Some(10), None),
            ("1-john", 4, Some(7), None),
        ]
    );
    assert_eq!(output.citations[0].form, BookForm::FullName);
}

#[test]
fn saint_prefixed_and_roman_prefixed_books() {
    let output = scan("St John vi. 44; Saint Luke xv. 7; I Cor. xiii. 4; II Tim. iii. 16");
    assert_eq!(
        refs(&output),
        vec![
            ("john", 6, Some(44), None),
            ("luke", 15, Some(7), None),
            ("1-corinthians", 13, Some(4), None),
            ("2-timothy", 3, Some(16), None),
        ]
    );
    assert_eq!(output.citations[0].form, BookForm::SaintPrefixed);
    assert_eq!(output.citations[1].form, BookForm::SaintPrefixed);
}

#[test]
fn multi_word_and_deuterocanonical_names() {
    let output = scan("Song of Solomon ii. 1, Ecclus. iii. 18 and Wisd. vii. 26.");
    assert_eq!(
        refs(&output),
        vec![
            ("song-of-solomon", 2, Some(1), None),
            ("sirach", 3, Some(18), None),
            ("wisdom", 7, Some(26), None),
        ]
    );
}

#[test]
fn book_matching_is_case_insensitive() {
    let output = scan("ROM. VIII. 13 and rom. viii. 14");
    assert_eq!(
        refs(&output),
        vec![("romans", 8, Some(13), None), ("romans", 8, Some(14), None)]
    );
}

#[test]
fn archaic_roman_forms_are_read_as_chapters() {
    let output = scan("Matt. xviiii. 6 and Rom. viij. 1");
    assert_eq!(
        refs(&output),
        vec![("matthew", 19, Some(6), None), ("romans", 8, Some(1), None)]
    );
}

#[test]
fn citations_at_text_edges_and_in_parentheses() {
    let output = scan("Isa. liii. 5 (cf. Heb. ix. 28) ends with Ps. cxix. 105");
    assert_eq!(
        refs(&output),
        vec![
            ("isaiah", 53, Some(5), None),
            ("hebrews", 9, Some(28), None),
            ("psalms", 119, Some(105), None),
        ]
    );
    assert_eq!(output.citations[0].offset, 0);
}

#[test]
fn book_names_inside_words_do_not_match() {
    let output = scan("The General 5 and Romanesque 3 are not citations, nor is Exodusian 4.");
    assert!(output.citations.is_empty());
}

fn ambiguous_tokens(output: &ScanOutput) -> Vec<&str> {
    output
        .dropped
        .iter()
        .map(|dropped| match &dropped.error {
            CitationError::AmbiguousChapterNumeral { token } => token.as_str(),
            other => panic!("unexpected drop reason: {other}"),
        })
        .collect()
}

#[test]
fn capital_pronoun_after_book_name_is_dropped_not_stored() {
    let output = scan("Yes, Sir I think so, said Mark I believe.");
    assert!(output.citations.is_empty());
    assert_eq!(ambiguous_tokens(&output), vec!["I", "I"]);
    assert_eq!(output.dropped[1].raw, "Mark I");
    assert_eq!(output.dropped[1].error.kind(), "ambiguous_chapter_numeral");
}

#[test]
fn capital_roman_chapter_with_its_own_period_is_accepted() {
    let output = scan("as Isaiah LIII. 5 and Psalm CXIX. 105 show");
    assert_eq!(
        refs(&output),
        vec![("isaiah", 53, Some(5), None), ("psalms", 119, Some(105), None)]
    );
    assert!(output.dropped.is_empty());
}

#[test]
fn initials_and_sentence_ends_are_not_chapters() {
    let output = scan(
        "Letters of the Rev. J. C. Ryle, and Col. J. Gardiner, and the Gospel of John. I believe it.",
    );
    assert!(output.citations.is_empty());
    assert_eq!(ambiguous_tokens(&output), vec!["J", "J", "I"]);

    let chapter_one = scan("Rev. I. 8 and Jude I. 3");
    assert_eq!(
        refs(&chapter_one),
        vec![("revelation", 1, Some(8), None), ("jude", 1, Some(3), None)]
    );
}

#[test]
fn verse_list_stops_before_a_numbered_book() {
    let output = scan("Rom. viii. 13, 2 Cor. v. 17");
    assert_eq!(
        refs(&output),
        vec![("romans", 8, Some(13), None), ("2-corinthians", 5, Some(17), None)]
    );
    assert_eq!(output.citations[0].clause, VerseClause::Single);
    assert_eq!(output.citations[0].end_offset, "Rom. viii. 13".len());

    let longer = scan("Gal. v. 16, 17, 1 John iii. 9");
    assert_eq!(
        refs(&longer),
        vec![
            ("galatians", 5, Some(16), None),
            ("galatians", 5, Some(17), None),
            ("1-john", 3, Some(9), None),
        ]
    );
    assert_eq!(longer.citations[0].clause, VerseClause::List);
}

#[test]
fn omitted_book_name_does_not_inherit_previous_book() {
    let output = scan("Rom. viii. 13 and v. 16 teach the same.");
    assert_eq!(refs(&output), vec![("romans", 8, Some(13), None)]);
}

#[test]
fn malformed_roman_chapter_is_dropped_with_reason() {
    let output = scan("and Job did not sin with his lips");
    assert!(output.citations.is_empty());
    assert_eq!(output.dropped.len(), 1);
    assert_eq!(
        output.dropped[0].error,
        CitationError::MalformedChapterVerseNumber {
            token: "did".to_string()
        }
    );
    assert_eq!(output.dropped[0].offset, 4);
}

#[test]
fn chapter_beyond_book_length_is_dropped() {
    let output = scan("Jude iv. 3 and Rom. xx. 1");
    assert!(output.citations.is_empty());
    assert_eq!(output.dropped.len(), 2);
    assert!(
        output
            .dropped
            .iter()
            .all(|dropped| dropped.error.kind() == "chapter_out_of_range")
    );
}

#[test]
fn zero_and_descending_verses_are_dropped_individually() {
    let output = scan("Rom. viii. 0 and Rom. viii. 17-13 but Rom. x. 3, 0");
    assert_eq!(refs(&output), vec![("romans", 10, Some(3), None)]);
    assert_eq!(output.dropped.len(), 3);
    assert!(
        output
            .dropped
            .iter()
            .all(|dropped| dropped.error.kind() == "malformed_chapter_verse_number")
    );
}

#[test]
fn unknown_book_in_citation_shape_is_reported() {
    let output = scan("as Hezek. ii. 4 records, and Romanz 8:13 too");
    assert!(output.citations.is_empty());
    let names: Vec<_> = output
        .dropped
        .iter()
        .map(|dropped| match &dropped.error {
            CitationError::UnresolvedBookName { name } => name.as_str(),
            other => panic!("unexpected drop reason: {other}"),
        })
        .collect();
    assert_eq!(names, vec!["Hezek", "Romanz"]);
    assert_eq!(output.dropped[0].offset, 3);
}

#[test]
fn offsets_are_code_points_not_bytes() {
    let text = "« Œuvres » — Rom. viii. 13";
    let output = scan(text);
    assert_eq!(output.citations.len(), 1);
    let expected = text.chars().take_while(|ch| *ch != 'R').count();
    assert_eq!(output.citations[0].offset, expected);
    assert_eq!(output.citations[0].end_offset, text.chars().count());
}

#[test]
fn citations_are_ordered_and_non_overlapping() {
    let output = scan(
        "Gal. v. 16, 17; Eph. ii. 8-10. Phil. iv. 13. Col. iii. Titus 2:11, and Jas. i. 5",
    );
    assert_eq!(output.citations.len(), 7);
    for pair in output.citations.windows(2) {
        assert!(pair[0].offset <= pair[1].offset);
        if pair[0].offset != pair[1].offset {
            assert!(pair[0].end_offset <= pair[1].offset);
        }
    }
}

#[test]
fn repeated_scans_are_identical() {
    let text = "Rom. viii. 13, 14 and Ps. xxvii. and John 3:16-18";
    assert_eq!(scan(text).citations, scan(text).citations);
}

#[test]
fn whitespace_reformatting_only_shifts_offsets() {
    let compact = "First Rom. viii. 13 here.\nThen Ps. xxvii. there.";
    let spaced = "First Rom. viii. 13 here.   \n\n\n  Then Ps. xxvii. there.  ";

    let before = scan(compact);
    let after = scan(spaced);
    assert_eq!(refs(&before), refs(&after));
    assert_eq!(before.citations[0].offset, after.citations[0].offset);
    assert!(after.citations[1].offset > before.citations[1].offset);
}
