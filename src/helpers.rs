use std::fmt::{Display, Formatter};

pub type TigerHashMap<K, V> = ahash::HashMap<K, V>;
pub type TigerHashSet<T> = ahash::HashSet<T>;

pub fn display_choices(f: &mut Formatter, v: &[&str], joiner: &str) -> Result<(), std::fmt::Error> {
    for i in 0..v.len() {
        write!(f, "{}", v[i])?;
        if i + 1 == v.len() {
        } else if i + 2 == v.len() {
            write!(f, " {joiner} ")?;
        } else {
            write!(f, ", ")?;
        }
    }
    Ok(())
}

/// The Choices struct exists to hook into the Display logic of printing to a string
struct Choices<'a> {
    choices: &'a [&'a str],
    joiner: &'a str,
}

impl Display for Choices<'_> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        display_choices(f, self.choices, self.joiner)
    }
}

pub fn stringify_choices(v: &[&str]) -> String {
    format!("{}", Choices { choices: v, joiner: "or" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices() {
        assert_eq!(stringify_choices(&["a"]), "a");
        assert_eq!(stringify_choices(&["a", "b"]), "a or b");
        assert_eq!(stringify_choices(&["a", "b", "c"]), "a, b or c");
    }
}
