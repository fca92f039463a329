use docrepo_core::collation::Collation;
use pretty_assertions::assert_eq;

fn sorted(locale: &str, words: &[&str]) -> Vec<String> {
    let collation = Collation::new(locale);
    let mut words = words.iter().map(|word| word.to_string()).collect::<Vec<_>>();
    words.sort_by(|a, b| collation.compare(a, b));
    words
}

#[test]
fn default_collation_ignores_case_at_first_level() {
    assert_eq!(sorted("en", &["banana", "Apple", "cherry"]), vec!["Apple", "banana", "cherry"]);
    assert_eq!(sorted("simple", &["banana", "Apple", "cherry"]), vec!["Apple", "banana", "cherry"]);
    assert_eq!(sorted("simple", &["banana", "apple", "Cherry"]), vec!["Cherry", "apple", "banana"]);
}

#[test]
fn lowercase_sorts_before_uppercase_on_ties() {
    assert_eq!(sorted("en", &["Apple", "apple"]), vec!["apple", "Apple"]);
}

#[test]
fn accents_only_break_ties() {
    assert_eq!(sorted("en", &["\u{e9}clair", "ecole", "eclair"]), vec!["eclair", "\u{e9}clair", "ecole"]);
}

#[test]
fn german_expands_umlauts() {
    // ä sorts as "ae", before "af".
    assert_eq!(sorted("de_DE", &["af", "\u{e4}b", "ad"]), vec!["ad", "\u{e4}b", "af"]);
}

#[test]
fn swedish_sorts_umlauts_after_z() {
    assert_eq!(sorted("sv", &["\u{f6}l", "zon", "ost"]), vec!["ost", "zon", "\u{f6}l"]);
}

#[test]
fn spanish_sorts_enye_after_n() {
    assert_eq!(sorted("es", &["\u{f1}u", "nz", "oa"]), vec!["nz", "\u{f1}u", "oa"]);
}

#[test]
fn language_is_taken_from_locale() {
    assert_eq!(Collation::new("de-AT").language(), "de");
    assert_eq!(Collation::default().language(), "en");
}
