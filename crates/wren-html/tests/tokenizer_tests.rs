//! Tokenizer behavior tests: token boundaries, raw-text mode, attribute
//! handling, and malformed-input recovery.

use wren_html::{Token, Tokenizer};

fn tokens(input: &str) -> Vec<Token> {
    Tokenizer::new(input).collect()
}

fn start_tag(name: &str) -> Token {
    Token::StartTag {
        name: name.to_string(),
        attributes: Vec::new(),
        self_closing: false,
    }
}

fn end_tag(name: &str) -> Token {
    Token::EndTag {
        name: name.to_string(),
    }
}

fn text(data: &str) -> Token {
    Token::Text {
        data: data.to_string(),
    }
}

#[test]
fn simple_element() {
    assert_eq!(
        tokens("<p>Hi</p>"),
        vec![start_tag("p"), text("Hi"), end_tag("p"), Token::EndOfInput]
    );
}

#[test]
fn text_runs_are_whole_tokens() {
    let toks = tokens("<p>a b  c</p>");
    assert_eq!(toks[1], text("a b  c"));
}

#[test]
fn tag_and_attribute_names_are_lowercased() {
    let toks = tokens(r#"<DIV CLASS="Box">"#);
    let Token::StartTag {
        name, attributes, ..
    } = &toks[0]
    else {
        panic!("expected start tag, got {:?}", toks[0]);
    };
    assert_eq!(name, "div");
    assert_eq!(attributes[0].name, "class");
    assert_eq!(attributes[0].value, "Box");
}

#[test]
fn attribute_quoting_styles() {
    let toks = tokens(r#"<a href="x" title='y' rel=z disabled>"#);
    let Token::StartTag { attributes, .. } = &toks[0] else {
        panic!("expected start tag");
    };
    let pairs: Vec<(&str, &str)> = attributes
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("href", "x"), ("title", "y"), ("rel", "z"), ("disabled", "")]
    );
}

#[test]
fn duplicate_attribute_keeps_first() {
    let toks = tokens(r#"<div id="first" id="second">"#);
    let Token::StartTag { attributes, .. } = &toks[0] else {
        panic!("expected start tag");
    };
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].value, "first");
}

#[test]
fn self_closing_tag() {
    let toks = tokens(r#"<img src="a.jpg"/>"#);
    assert!(matches!(
        &toks[0],
        Token::StartTag { self_closing, .. } if *self_closing
    ));
}

#[test]
fn script_content_is_raw_text() {
    assert_eq!(
        tokens("<script>a<b</script>"),
        vec![
            start_tag("script"),
            text("a<b"),
            end_tag("script"),
            Token::EndOfInput
        ]
    );
}

#[test]
fn raw_text_ignores_non_matching_end_tags() {
    let toks = tokens("<style>p { } </div> more</style>");
    assert_eq!(toks[1], text("p { } </div> more"));
    assert_eq!(toks[2], end_tag("style"));
}

#[test]
fn raw_text_end_tag_may_carry_whitespace() {
    let toks = tokens("<title>x < y</title >");
    assert_eq!(toks[1], text("x < y"));
    assert_eq!(toks[2], end_tag("title"));
}

#[test]
fn textarea_content_is_raw_text() {
    let toks = tokens("<textarea><p>not markup</p></textarea>");
    assert_eq!(toks[1], text("<p>not markup</p>"));
}

#[test]
fn comments_are_tokenized() {
    assert_eq!(
        tokens("<!-- hello -->"),
        vec![
            Token::Comment {
                data: " hello ".to_string()
            },
            Token::EndOfInput
        ]
    );
}

#[test]
fn doctype_is_skipped() {
    assert_eq!(
        tokens("<!DOCTYPE html><p>"),
        vec![start_tag("p"), Token::EndOfInput]
    );
}

#[test]
fn malformed_tag_open_resynchronizes_at_next_tag() {
    // "<>" has no tag name; everything up to the next '<' is discarded.
    assert_eq!(
        tokens("<>junk<p>ok</p>"),
        vec![start_tag("p"), text("ok"), end_tag("p"), Token::EndOfInput]
    );
}

#[test]
fn empty_end_tag_is_dropped() {
    assert_eq!(
        tokens("a</>b"),
        vec![text("a"), text("b"), Token::EndOfInput]
    );
}

#[test]
fn unterminated_tag_at_end_of_input_is_dropped() {
    assert_eq!(
        tokens("Hello<di"),
        vec![text("Hello"), Token::EndOfInput]
    );
}

#[test]
fn unterminated_raw_text_flushes_content() {
    let toks = tokens("<script>var x = 1;");
    assert_eq!(toks[1], text("var x = 1;"));
    assert_eq!(toks[2], Token::EndOfInput);
}

#[test]
fn streaming_feed_across_a_tag_boundary() {
    let mut tokenizer = Tokenizer::streaming();
    tokenizer.feed("<di");
    assert_eq!(tokenizer.next(), None);
    assert!(!tokenizer.is_exhausted());

    tokenizer.feed("v>hi");
    tokenizer.finish();
    let toks: Vec<Token> = tokenizer.by_ref().collect();
    assert_eq!(
        toks,
        vec![start_tag("div"), text("hi"), Token::EndOfInput]
    );
    assert!(tokenizer.is_exhausted());
}

#[test]
fn exhausted_tokenizer_stays_exhausted() {
    let mut tokenizer = Tokenizer::new("x");
    let first: Vec<Token> = tokenizer.by_ref().collect();
    assert_eq!(first.last(), Some(&Token::EndOfInput));
    tokenizer.feed("more");
    assert_eq!(tokenizer.next(), None);
}
