use super::*;

#[test]
fn parse_plain_triplet_lines() {
    let response = "(foo, is, bar)\n(hello, is not, world)\n(Jane, is mother of, Bob)";

    let triplets = parse_triplet_response(response);

    assert_eq!(
        triplets,
        vec![
            Triplet::new("foo", "is", "bar"),
            Triplet::new("hello", "is not", "world"),
            Triplet::new("Jane", "is mother of", "Bob"),
        ]
    );
}

#[test]
fn parse_ignores_surrounding_prose() {
    let response = "Here are the triplets I found in the text:\n\
                    \n\
                    (Jane, is mother of, Bob)\n\
                    Let me know if you need anything else!";

    let triplets = parse_triplet_response(response);

    assert_eq!(triplets, vec![Triplet::new("Jane", "is mother of", "Bob")]);
}

#[test]
fn parse_triplet_with_text_on_same_line() {
    let response = "Triplets:\n\
                    1. (foo, is, bar) - the first\n\
                    2. (hello, is not, world)\n\
                    3. The last one is (Jane, is mother of, Bob).";

    let triplets = parse_triplet_response(response);

    assert_eq!(triplets.len(), 3);
    assert!(triplets.contains(&Triplet::new("foo", "is", "bar")));
    assert!(triplets.contains(&Triplet::new("hello", "is not", "world")));
    assert!(triplets.contains(&Triplet::new("Jane", "is mother of", "Bob")));
}

#[test]
fn parse_trims_whitespace_in_fields() {
    let triplets = parse_triplet_response("(  Paris ,is capital of,   France  )");

    assert_eq!(triplets, vec![Triplet::new("Paris", "is capital of", "France")]);
}

#[test]
fn parse_skips_wrong_arity_and_empty_fields() {
    let response = "(only, two)\n\
                    (one, two, three, four)\n\
                    (, is, empty)\n\
                    (subject, ,object)\n\
                    ()\n\
                    ) backwards (\n\
                    no parens at all";

    assert!(parse_triplet_response(response).is_empty());
}

#[test]
fn parse_embedded_comma_is_not_supported() {
    let triplets = parse_triplet_response("(Smith, John, wrote, a book)");

    assert!(triplets.is_empty());
}

#[test]
fn parse_empty_response() {
    assert!(parse_triplet_response("").is_empty());
}

#[test]
fn canonical_string_format() {
    let triplet = Triplet::new("Jane", "is mother of", "Bob");

    assert_eq!(triplet.canonical_string(), "(Jane, is mother of, Bob)");
    assert_eq!(triplet.to_string(), "(Jane, is mother of, Bob)");
}

#[test]
fn validate_rejects_empty_fields() {
    assert!(Triplet::new("a", "b", "c").validate().is_ok());

    let err = Triplet::new("", "is", "bar")
        .validate()
        .expect_err("empty subject should be rejected");
    assert!(matches!(err, KgError::InvalidTriplet { ref reason, .. } if reason == "subject is empty"));

    assert!(Triplet::new("foo", "  ", "bar").validate().is_err());
    assert!(Triplet::new("foo", "is", "").validate().is_err());
}

#[test]
fn from_tuple() {
    let triplet: Triplet = ("foo", "is", "bar").into();

    assert_eq!(triplet, Triplet::new("foo", "is", "bar"));
}
