mod counter;
mod frontmatter;
mod print;
mod sections;
mod suite;

pub use counter::CheckboxCounter;
pub use frontmatter::Frontmatter;
pub use print::{PrintBand, PrintConfig, PrintLayout};
pub use sections::{ExecutionRow, Sections, TestData};
pub use suite::{CompiledTestCase, SuiteRecord, SuiteReport};
