use unicode_segmentation::UnicodeSegmentation;

/// One bounded slice of source text, sent to a backend as a single
/// synthesis unit. Order is significant and preserved through synthesis
/// and assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub index: usize,
    pub content: String,
}

/// Replace control characters (except CR/LF/TAB) with spaces, collapse runs
/// of whitespace and trim. All pipeline character counts are taken on text
/// in this form.
pub fn normalize_whitespace(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_control() && !matches!(c, '\r' | '\n' | '\t') {
                ' '
            } else {
                c
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sentence-aware segmentation that keeps every segment at or under
/// `max_chars` characters.
///
/// Sentences are located with a Unicode sentence-boundary pass and packed
/// greedily; a sentence longer than the limit is split on word boundaries,
/// and a single over-long word is hard-sliced. If the boundary pass yields
/// nothing for non-blank input, a regex split on terminal punctuation takes
/// over.
pub fn split_by_sentences(text: &str, max_chars: usize) -> Vec<TextSegment> {
    let max_chars = max_chars.max(1);
    let mut chunks = split_unicode(text, max_chars);
    if chunks.is_empty() && !text.trim().is_empty() {
        chunks = split_terminal_punct(text, max_chars);
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, content)| TextSegment { index, content })
        .collect()
}

/// Greedy packer shared by both split passes. Tokens are joined with single
/// spaces; a flush happens whenever the next token would push the buffer
/// past the limit.
struct SegmentBuf {
    max: usize,
    buf: String,
    buf_chars: usize,
    out: Vec<String>,
}

impl SegmentBuf {
    fn new(max: usize) -> Self {
        Self {
            max,
            buf: String::new(),
            buf_chars: 0,
            out: Vec::new(),
        }
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.out.push(std::mem::take(&mut self.buf));
            self.buf_chars = 0;
        }
    }

    fn push_token(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        let token_chars = token.chars().count();
        if self.buf.is_empty() {
            self.buf.push_str(token);
            self.buf_chars = token_chars;
        } else if self.buf_chars + 1 + token_chars <= self.max {
            self.buf.push(' ');
            self.buf.push_str(token);
            self.buf_chars += 1 + token_chars;
        } else {
            self.flush();
            self.buf.push_str(token);
            self.buf_chars = token_chars;
        }
    }

    /// A sentence that fits is packed whole; otherwise it degrades to words,
    /// and a word longer than the limit degrades to fixed-size char slices.
    fn push_sentence(&mut self, sentence: &str) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return;
        }
        if sentence.chars().count() <= self.max {
            self.push_token(sentence);
            return;
        }
        for word in sentence.split_whitespace() {
            if word.chars().count() > self.max {
                for piece in char_slices(word, self.max) {
                    self.push_token(&piece);
                }
            } else {
                self.push_token(word);
            }
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.out
    }
}

fn split_unicode(text: &str, max_chars: usize) -> Vec<String> {
    let s = text.trim();
    if s.is_empty() {
        return Vec::new();
    }
    let mut packer = SegmentBuf::new(max_chars);
    for sentence in s.split_sentence_bounds() {
        packer.push_sentence(sentence);
    }
    packer.finish()
}

/// Fallback tier: rough sentence split on terminal punctuation followed by
/// whitespace, as in the batching code this crate grew out of.
fn split_terminal_punct(text: &str, max_chars: usize) -> Vec<String> {
    static SENTENCE_END: once_cell::sync::Lazy<regex::Regex> =
        once_cell::sync::Lazy::new(|| regex::Regex::new(r"[.!?]+\s+").expect("valid regex"));

    let s = text.trim();
    if s.is_empty() {
        return Vec::new();
    }
    let mut packer = SegmentBuf::new(max_chars);
    let mut last_end = 0;
    for mat in SENTENCE_END.find_iter(s) {
        packer.push_sentence(&s[last_end..mat.end()]);
        last_end = mat.end();
    }
    if last_end < s.len() {
        packer.push_sentence(&s[last_end..]);
    }
    packer.finish()
}

fn char_slices(word: &str, max: usize) -> Vec<String> {
    word.chars()
        .collect::<Vec<_>>()
        .chunks(max)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
