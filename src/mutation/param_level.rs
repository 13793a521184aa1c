use rand::{Rng, RngCore};

use crate::log::log;
use crate::payloads::PayloadCollection;

/// One per-parameter mutation rule: a total function over a
/// (name, values) pair. Values are never empty by the time they get here,
/// that is the corpus builder's responsibility.
pub trait MutateParam {
    fn id(&self) -> &'static str;

    fn apply(
        &self,
        rng: &mut dyn RngCore,
        name: &str,
        values: &[String],
    ) -> (String, Vec<String>);
}

// lowercase + punctuation + digits
const RANDOM_TEXT_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyz!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~0123456789";

pub fn random_string(rng: &mut dyn RngCore, length: usize) -> String {
    (0..length)
        .map(|_| RANDOM_TEXT_ALPHABET[rng.gen_range(0..RANDOM_TEXT_ALPHABET.len())] as char)
        .collect()
}

/// Fair coin: prepend the token to every value, or append it to every
/// value. One draw covers the whole list.
fn splice_into_values(rng: &mut dyn RngCore, token: &str, values: &[String]) -> Vec<String> {
    if rng.gen::<bool>() {
        values.iter().map(|value| format!("{token}{value}")).collect()
    } else {
        values.iter().map(|value| format!("{value}{token}")).collect()
    }
}

/// `foo[2]` -> `foo`, `foo[]` -> `foo`, `a[b][c]` -> `a[b]`. None when the
/// name does not end in a bracket group.
fn strip_trailing_brackets(name: &str) -> Option<&str> {
    if !name.ends_with(']') {
        return None;
    }

    // the bracket group must not itself contain '[', so only the last
    // opening bracket can start it
    let open = name.rfind('[')?;
    if open == name.len() - 1 {
        return None;
    }

    Some(&name[..open])
}

/// Leaves the parameter untouched. Registered so that a fraction of
/// mutations intentionally keep a parameter as-is.
pub struct Skip;

impl MutateParam for Skip {
    fn id(&self) -> &'static str {
        "skip"
    }

    fn apply(
        &self,
        _rng: &mut dyn RngCore,
        name: &str,
        values: &[String],
    ) -> (String, Vec<String>) {
        (name.to_string(), values.to_vec())
    }
}

/// Flips a parameter between scalar and array style to probe how the
/// backend's parameter parser treats `p` against `p[]` and `p[2]`.
pub struct AlterType;

impl MutateParam for AlterType {
    fn id(&self) -> &'static str {
        "alter_type"
    }

    fn apply(
        &self,
        _rng: &mut dyn RngCore,
        name: &str,
        values: &[String],
    ) -> (String, Vec<String>) {
        let new_name = match strip_trailing_brackets(name) {
            Some(base) => base.to_string(),
            None => format!("{name}[]"),
        };

        log!("alter_type: {name} -> {new_name}");

        (new_name, values.to_vec())
    }
}

/// Splices 1 to 5 random characters into every value.
pub struct AddRandomText;

impl MutateParam for AddRandomText {
    fn id(&self) -> &'static str {
        "random_text"
    }

    fn apply(
        &self,
        rng: &mut dyn RngCore,
        name: &str,
        values: &[String],
    ) -> (String, Vec<String>) {
        let length = rng.gen_range(1..=5);
        let token = random_string(rng, length);

        (name.to_string(), splice_into_values(rng, &token, values))
    }
}

/// Splices one HTML/PHP/JS syntax token into every value.
pub struct AddSyntaxToken {
    pub tokens: PayloadCollection,
}

impl MutateParam for AddSyntaxToken {
    fn id(&self) -> &'static str {
        "syntax_token"
    }

    fn apply(
        &self,
        rng: &mut dyn RngCore,
        name: &str,
        values: &[String],
    ) -> (String, Vec<String>) {
        let token = self.tokens.sample(rng).to_string();

        (name.to_string(), splice_into_values(rng, &token, values))
    }
}

/// Splices one XSS payload into every value.
pub struct AddXssPayload {
    pub payloads: PayloadCollection,
}

impl MutateParam for AddXssPayload {
    fn id(&self) -> &'static str {
        "xss_payload"
    }

    fn apply(
        &self,
        rng: &mut dyn RngCore,
        name: &str,
        values: &[String],
    ) -> (String, Vec<String>) {
        let payload = self.payloads.sample(rng).to_string();

        (name.to_string(), splice_into_values(rng, &payload, values))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::payloads::Category;

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Every output value must be token+original or original+token, with
    /// one placement for the entire list.
    fn assert_spliced(original: &[String], mutated: &[String]) {
        assert_eq!(original.len(), mutated.len());

        let prefixed = mutated
            .iter()
            .zip(original)
            .all(|(new, old)| new.len() > old.len() && new.ends_with(old.as_str()));
        let suffixed = mutated
            .iter()
            .zip(original)
            .all(|(new, old)| new.len() > old.len() && new.starts_with(old.as_str()));

        assert!(
            prefixed || suffixed,
            "inconsistent placement: {original:?} -> {mutated:?}"
        );

        // same token on every value
        let tokens: Vec<&str> = mutated
            .iter()
            .zip(original)
            .map(|(new, old)| {
                if prefixed {
                    &new[..new.len() - old.len()]
                } else {
                    &new[old.len()..]
                }
            })
            .collect();
        assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn skip_is_identity() {
        let mut rng = StdRng::seed_from_u64(0);

        let inputs = [
            ("plain", strings(&["a"])),
            ("weird[0]", strings(&["x", "y", "z"])),
            ("", strings(&[""])),
        ];

        for (name, values) in inputs {
            let (new_name, new_values) = Skip.apply(&mut rng, name, &values);
            assert_eq!(new_name, name);
            assert_eq!(new_values, values);
        }
    }

    #[test]
    fn alter_type_appends_brackets_to_scalar_names() {
        let mut rng = StdRng::seed_from_u64(0);
        let values = strings(&["1"]);

        for (name, expected) in [
            ("p", "p[]"),
            ("foo]", "foo][]"),
            ("fo[o]x", "fo[o]x[]"),
            ("", "[]"),
        ] {
            let (new_name, new_values) = AlterType.apply(&mut rng, name, &values);
            assert_eq!(new_name, expected);
            assert_eq!(new_values, values);
        }
    }

    #[test]
    fn alter_type_strips_one_trailing_bracket_group() {
        let mut rng = StdRng::seed_from_u64(0);
        let values = strings(&["1"]);

        for (name, expected) in [
            ("foo[2]", "foo"),
            ("foo[]", "foo"),
            ("a[b][c]", "a[b]"),
            ("[]", ""),
        ] {
            let (new_name, _) = AlterType.apply(&mut rng, name, &values);
            assert_eq!(new_name, expected);
        }
    }

    #[test]
    fn alter_type_twice_is_identity_on_scalar_names() {
        let mut rng = StdRng::seed_from_u64(0);
        let values = strings(&["v"]);

        let (once, _) = AlterType.apply(&mut rng, "p", &values);
        let (twice, _) = AlterType.apply(&mut rng, &once, &values);

        assert_eq!(once, "p[]");
        assert_eq!(twice, "p");
    }

    #[test]
    fn random_text_splices_consistently() {
        let mut rng = StdRng::seed_from_u64(42);
        let values = strings(&["alpha", "beta", ""]);

        for _ in 0..200 {
            let (name, mutated) = AddRandomText.apply(&mut rng, "q", &values);
            assert_eq!(name, "q");
            assert_eq!(mutated.len(), values.len());

            // token length is bounded and uniform across values
            let delta = mutated[0].len() - values[0].len();
            assert!((1..=5).contains(&delta));
            for (new, old) in mutated.iter().zip(&values) {
                assert_eq!(new.len() - old.len(), delta);
            }
        }
    }

    #[test]
    fn token_strategies_splice_a_known_payload() {
        let collection =
            PayloadCollection::new(vec![Category::new("only", 1, strings(&["<tok>"]))]).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let values = strings(&["one", "two"]);

        let syntax = AddSyntaxToken {
            tokens: collection.clone(),
        };
        let xss = AddXssPayload {
            payloads: collection,
        };

        for strategy in [&syntax as &dyn MutateParam, &xss as &dyn MutateParam] {
            for _ in 0..50 {
                let (name, mutated) = strategy.apply(&mut rng, "p", &values);
                assert_eq!(name, "p");
                assert_spliced(&values, &mutated);
                assert!(mutated[0].contains("<tok>"));
            }
        }
    }

    #[test]
    fn random_string_uses_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let text = random_string(&mut rng, 5);
            assert_eq!(text.len(), 5);
            assert!(text
                .bytes()
                .all(|byte| RANDOM_TEXT_ALPHABET.contains(&byte)));
        }
    }
}
