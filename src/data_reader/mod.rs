mod buf_reader;
pub mod nbest_reader;
pub mod sentence_reader;

pub use self::buf_reader::BufReader;
pub use self::nbest_reader::NBestReader;
pub use self::sentence_reader::SentenceReader;
