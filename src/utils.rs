use std::str::FromStr;

/// Optional lower (inclusive) and upper (exclusive) limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Bounds<T> {
    pub fn none() -> Self { Self { min: None, max: None } }
}

impl<T: PartialOrd> Bounds<T> {
    pub fn contains(&self, x: &T) -> bool {
        self.min.as_ref().map_or(true, |min| min <= x) &&
        self.max.as_ref().map_or(true, |max| x <  max)
    }
}

/// Parse `a..b`, `a..`, `..b` or `..`
impl<T: FromStr> FromStr for Bounds<T> {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lo, hi) = s.split_once("..")
            .ok_or_else(|| format!("Could not find '..' when parsing range `{s}`."))?;
        let bad = |x: &str| format!("Could not parse `{x}` in range `{s}`.");
        Ok(Self {
            min: parse_if_not_empty(lo).map_err(|_| bad(lo))?,
            max: parse_if_not_empty(hi).map_err(|_| bad(hi))?,
        })
    }
}

fn parse_if_not_empty<T: FromStr>(s: &str) -> Result<Option<T>, <T as FromStr>::Err> {
    Ok(if s.is_empty() { None }
       else            { Some(s.parse()?) })
}

/// Log to stderr at `info` level, unless `RUST_LOG` says otherwise
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}


pub mod timing {

    use super::group_digits;
    use std::time::Instant;
    use std::io::Write;

    pub struct Progress {
        previous: Instant,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now() } }

        /// Print message, append ellipsis, flush stderr, stay on same line, start timer.
        pub fn start(&mut self, message: &str) {
            eprint!("{message} ... ");
            std::io::stderr().flush().ok();
            self.start_timer();
        }

        // Print time elapsed since last start or done
        pub fn done(&mut self) {
            eprintln!("{} ms", group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        // Print message followed by time elapsed since last start or done
        pub fn done_with_message(&mut self, message: &str) {
            eprintln!("{message}: {} ms",
                      group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}


#[cfg(test)]
mod test_bounds {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/ text    , min     , max    ,
             case("3..10" , Some(3) , Some(10)),
             case("3.."   , Some(3) , None    ),
             case("..10"  , None    , Some(10)),
             case(".."    , None    , None    ),
    )]
    fn parse(text: &str, min: Option<usize>, max: Option<usize>) {
        assert_eq!(text.parse::<Bounds<usize>>(), Ok(Bounds { min, max }));
    }

    #[rstest(text, case("3"), case("a..4"), case("3..-1"))]
    fn parse_failure(text: &str) {
        assert!(text.parse::<Bounds<usize>>().is_err());
    }

    #[test]
    fn contains() {
        let b: Bounds<usize> = "3..5".parse().unwrap();
        assert!(!b.contains(&2));
        assert!( b.contains(&3));
        assert!( b.contains(&4));
        assert!(!b.contains(&5));
        assert!(Bounds::<usize>::none().contains(&1_000_000));
    }

    #[test]
    fn digits_are_grouped() {
        assert_eq!(group_digits(1234567), "1,234,567");
    }
}
