//! Bounded-size text segmentation with continuity preambles.
//!
//! Long transcripts are split into chunks that fit a rewrite service's
//! context window. Splitting prefers paragraph boundaries; a paragraph that
//! alone exceeds the budget is split on sentence-terminal punctuation
//! instead, and a sentence is never split regardless of length. Each chunk
//! after the first carries the tail of its predecessor's source text so the
//! rewrite call has enough context to continue coherently.

/// A bounded slice of a larger text, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in document order, starting at 0.
    pub index: usize,
    /// The chunk's own text. At most `max_chars` characters unless the chunk
    /// is a single indivisible sentence.
    pub body: String,
    /// Tail of the previous chunk's source text (its last whole paragraph,
    /// or last sentence when an oversized paragraph was being split). Always
    /// source text, never rewritten output. `None` for the first chunk.
    pub preamble: Option<String>,
    /// True when `body` resumes a paragraph whose head lives in the previous
    /// chunk. Used to reconstruct the source text losslessly.
    pub continues_paragraph: bool,
}

impl Chunk {
    /// Number of characters in the body.
    pub fn char_count(&self) -> usize {
        self.body.chars().count()
    }

    /// The text handed to the rewrite service: the rendered continuity block
    /// (when present) followed by the body. The preamble lives only in this
    /// rendering, never in `body` itself.
    pub fn contextual_text(&self) -> String {
        match &self.preamble {
            Some(p) => format!("【前文衔接】\n{}\n\n{}", p, self.body),
            None => self.body.clone(),
        }
    }
}

/// The rewrite service's output for one chunk.
///
/// `index` matches the source [`Chunk`]; it is the only way document order
/// is recovered, so implementations are free to complete rewrites out of
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenChunk {
    pub index: usize,
    pub text: String,
}

/// Sentence-terminal punctuation. A terminator stays attached to the
/// sentence it closes.
const SENTENCE_TERMINATORS: [char; 3] = ['。', '！', '？'];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Paragraphs (blank-line-delimited) are accumulated until the next one
/// would overflow the budget; the closed chunk's last paragraph becomes the
/// next chunk's continuity preamble. A paragraph that alone exceeds
/// `max_chars` is split into sentences and accumulated the same way, with
/// the last sentence as the continuity seed. Only the immediately preceding
/// chunk's tail is carried forward, never a rolling summary.
///
/// Empty or whitespace-only input yields no chunks. Input without any blank
/// line is treated as one paragraph.
pub fn segment(text: &str, max_chars: usize) -> Vec<Chunk> {
    let paras = paragraphs(text);
    if paras.is_empty() {
        return Vec::new();
    }

    let mut builder = Builder::new(max_chars);
    for para in &paras {
        if char_len(para) > max_chars {
            builder.begin_oversized();
            for sentence in split_sentences(para) {
                builder.push_sentence(sentence);
            }
            builder.end_oversized();
        } else {
            builder.push_paragraph(para);
        }
    }
    let chunks = builder.finish();

    debug_assert_eq!(reassemble_source(&chunks), paras.join("\n\n"));
    chunks
}

/// Reconstruct the source text from chunks: bodies joined with a blank line,
/// except where a chunk resumes a split paragraph. Paragraph boundaries are
/// normalized to a single blank line.
pub fn reassemble_source(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        if chunk.index > 0 && !chunk.continues_paragraph {
            out.push_str("\n\n");
        }
        out.push_str(&chunk.body);
    }
    out
}

/// Combine rewritten chunks into one document: order by `index`, join with a
/// blank line. This is the only place document order is reconstructed.
pub fn reassemble(mut chunks: Vec<RewrittenChunk>) -> String {
    chunks.sort_by_key(|c| c.index);
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Group consecutive non-blank lines into paragraphs.
fn paragraphs(text: &str) -> Vec<String> {
    let mut paras = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                paras.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paras.push(current.join("\n"));
    }
    paras
}

/// Split a paragraph into sentences, each keeping its terminator. Trailing
/// text without a terminator forms the final sentence.
fn split_sentences(para: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in para.chars() {
        current.push(ch);
        if SENTENCE_TERMINATORS.contains(&ch) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Accumulates units (paragraphs or sentences) into chunks.
///
/// A chunk holds either whole paragraphs or sentences from one oversized
/// paragraph, never a mix; oversized paragraphs close the surrounding chunk
/// on both sides. The continuity seed for the next chunk is captured at
/// close time from the closing chunk's last unit.
struct Builder {
    max_chars: usize,
    chunks: Vec<Chunk>,
    units: Vec<String>,
    len: usize,
    sentence_mode: bool,
    pending_preamble: Option<String>,
    pending_continues: bool,
}

impl Builder {
    fn new(max_chars: usize) -> Self {
        Builder {
            max_chars,
            chunks: Vec::new(),
            units: Vec::new(),
            len: 0,
            sentence_mode: false,
            pending_preamble: None,
            pending_continues: false,
        }
    }

    fn push_paragraph(&mut self, para: &str) {
        let plen = char_len(para);
        // +2 accounts for the blank-line joiner inside the body.
        if !self.units.is_empty() && self.len + 2 + plen > self.max_chars {
            self.close();
            self.pending_continues = false;
        }
        if !self.units.is_empty() {
            self.len += 2;
        }
        self.units.push(para.to_string());
        self.len += plen;
    }

    fn begin_oversized(&mut self) {
        self.close();
        self.pending_continues = false;
        self.sentence_mode = true;
    }

    fn push_sentence(&mut self, sentence: String) {
        let slen = char_len(&sentence);
        if !self.units.is_empty() && self.len + slen > self.max_chars {
            self.close();
            self.pending_continues = true;
        }
        self.len += slen;
        self.units.push(sentence);
    }

    fn end_oversized(&mut self) {
        self.close();
        self.pending_continues = false;
        self.sentence_mode = false;
    }

    /// Emit the accumulated units as a chunk, seeding the next chunk's
    /// preamble from the last unit. No-op when nothing is accumulated.
    fn close(&mut self) {
        if self.units.is_empty() {
            return;
        }
        let body = if self.sentence_mode {
            self.units.concat()
        } else {
            self.units.join("\n\n")
        };
        let seed = self.units.last().cloned();
        self.chunks.push(Chunk {
            index: self.chunks.len(),
            body,
            preamble: self.pending_preamble.take(),
            continues_paragraph: self.pending_continues,
        });
        self.pending_preamble = seed;
        self.units.clear();
        self.len = 0;
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.close();
        self.chunks
    }
}
