// Positional bind arguments for hand-assembled statements.

use std::fmt;

/// A value bound to one `$n` slot of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Text(String),
    BigInt(i64),
}

impl From<String> for Arg {
    fn from(s: String) -> Arg {
        Arg::Text(s)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Arg {
        Arg::Text(s.to_owned())
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Arg {
        Arg::BigInt(v)
    }
}

/// Reference to the 1-based position of a bound argument. Renders as `$n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(usize);

impl Placeholder {
    pub fn position(self) -> usize {
        self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Ordered argument list. Values can only be appended, so a placeholder
/// handed out once keeps pointing at the same value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Args {
    values: Vec<Arg>,
}

impl Args {
    pub fn new() -> Args {
        Args::default()
    }

    pub fn append<V: Into<Arg>>(&mut self, value: V) -> Placeholder {
        self.values.push(value.into());
        Placeholder(self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&Arg> {
        self.values.get(placeholder.0.checked_sub(1)?)
    }

    pub fn into_vec(self) -> Vec<Arg> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_count_from_one() {
        let mut args = Args::new();
        let a = args.append("jane");
        let b = args.append(7i64);
        let c = args.append(String::from("go"));

        assert_eq!(a.to_string(), "$1");
        assert_eq!(b.to_string(), "$2");
        assert_eq!(c.to_string(), "$3");
        assert_eq!(args.len(), 3);
        assert_eq!(args.get(b), Some(&Arg::BigInt(7)));
        assert_eq!(
            args.into_vec(),
            vec![
                Arg::Text("jane".into()),
                Arg::BigInt(7),
                Arg::Text("go".into())
            ]
        );
    }

    #[test]
    fn empty_accumulator_is_legal() {
        let args = Args::new();
        assert!(args.is_empty());
        assert!(args.into_vec().is_empty());
    }

    #[test]
    fn reused_placeholder_keeps_its_value() {
        let mut args = Args::new();
        let viewer = args.append(42i64);
        args.append("other");
        assert_eq!(viewer.position(), 1);
        assert_eq!(args.get(viewer), Some(&Arg::BigInt(42)));
    }
}
