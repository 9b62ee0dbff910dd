//! Status lines for the terminal. Results (suite counts, written files)
//! go to stdout; skipped documents and errors go to stderr so that
//! `mantest compile -o -` still pipes clean HTML.

/// One coloured `[x] message` line. `$out` is `println` or `eprintln`.
#[macro_export]
macro_rules! status {
    ($out:ident, $colour:literal, $mark:literal, $($arg:tt)*) => {
        $out!("[\x1b[{}m{}\x1b[0m] {}", $colour, $mark, format!($($arg)*))
    };
}

/// Suite listings and compile summaries: yellow `[*]`.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { status!(println, 33, "*", $($arg)*) };
}

/// A suite or PDF written, or a validation run that passed: green `[+]`.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => { status!(println, 32, "+", $($arg)*) };
}

/// Skipped test cases and an existing PDF left in place: magenta `[!]`.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { status!(eprintln, 35, "!", $($arg)*) };
}

/// Per-file validation failures and the final error: red `[-]`.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { status!(eprintln, 31, "-", $($arg)*) };
}
