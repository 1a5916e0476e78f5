use super::*;

fn no_overlap(chunk_size: usize) -> ChunkingConfig {
    ChunkingConfig {
        chunk_size,
        chunk_overlap: 0,
    }
}

#[test]
fn estimate_token_count_heuristic() {
    assert_eq!(estimate_token_count("hello world"), 2);
    assert_eq!(estimate_token_count("This is a test."), 5);
    assert_eq!(estimate_token_count(""), 0);
}

#[test]
fn small_document_is_single_chunk() {
    let document = Document::with_id("doc", "(foo, is, bar)");

    let chunks = split_document(&document, &ChunkingConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].id, "doc-0");
    assert_eq!(chunks[0].text, "(foo, is, bar)");
    assert_eq!(chunks[0].ref_doc_id.as_deref(), Some("doc"));
}

#[test]
fn paragraphs_split_when_over_target() {
    let paragraph = "one two three four five six seven eight nine";
    let text = format!("{p}\n\n{p}\n\n{p}", p = paragraph);
    let document = Document::with_id("doc", text);

    let chunks = split_document(&document, &no_overlap(16));

    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.text == paragraph));
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["doc-0", "doc-1", "doc-2"]);
}

#[test]
fn small_paragraphs_are_packed() {
    let document = Document::with_id("doc", "alpha beta\n\ngamma delta\n\n\n\nepsilon");

    let chunks = split_document(&document, &no_overlap(64));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "alpha beta\n\ngamma delta\n\nepsilon");
}

#[test]
fn long_paragraph_falls_back_to_sentences() {
    let sentence = "The quick brown fox jumps over the lazy dog.";
    let text = [sentence; 6].join(" ");
    let document = Document::with_id("doc", text);

    let chunks = split_document(&document, &no_overlap(20));

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.text.ends_with('.'));
        assert!(chunk.text.starts_with("The"));
    }
}

#[test]
fn long_sentence_falls_back_to_words() {
    let text = (0..100).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
    let document = Document::with_id("doc", text);

    let chunks = split_document(&document, &no_overlap(16));

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(estimate_token_count(&chunk.text) <= 16);
    }
}

#[test]
fn overlap_prefixes_previous_tail() {
    let first = "one two three four five six seven eight nine";
    let second = "ten eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen";
    let document = Document::with_id("doc", format!("{}\n\n{}", first, second));
    let config = ChunkingConfig {
        chunk_size: 16,
        chunk_overlap: 4,
    };

    let chunks = split_document(&document, &config);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, first);
    assert_eq!(chunks[1].text, format!("seven eight nine {}", second));
}

#[test]
fn empty_document_has_no_chunks() {
    let document = Document::with_id("doc", "  \n\n  ");

    assert!(split_document(&document, &ChunkingConfig::default()).is_empty());
}
