//! Sentence-based text chunking.

use crate::error::{KursError, Result};
use regex::Regex;

/// Splits text into chunks of whole sentences.
///
/// Sentences are packed until the next one would push a chunk past
/// `chunk_size` characters. Trailing sentences totalling at most
/// `chunk_overlap` characters are repeated at the start of the next chunk,
/// as long as the next chunk still fits in `chunk_size` with its first new
/// sentence. A single sentence longer than `chunk_size` becomes its own chunk.
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    sentence: Regex,
}

impl SentenceChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(KursError::Config("chunk_size must be greater than 0".to_string()));
        }

        let sentence = Regex::new(r"[^.!?]+(?:[.!?]+|$)")
            .map_err(|e| KursError::Ingest(format!("Invalid sentence pattern: {}", e)))?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
            sentence,
        })
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        self.sentence
            .find_iter(&normalized)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Chunk `text`. Blank text yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0;

        for sentence in self.sentences(text) {
            let added = if current.is_empty() {
                sentence.len()
            } else {
                sentence.len() + 1
            };

            if !current.is_empty() && current_len + added > self.chunk_size {
                chunks.push(current.join(" "));
                current = self.overlap(&current);
                current_len = joined_len(&current);

                while !current.is_empty() && current_len + sentence.len() + 1 > self.chunk_size {
                    current.remove(0);
                    current_len = joined_len(&current);
                }
            }

            current_len += if current.is_empty() {
                sentence.len()
            } else {
                sentence.len() + 1
            };
            current.push(sentence);
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        chunks
    }

    /// Trailing sentences that fit in the overlap budget.
    fn overlap(&self, sentences: &[String]) -> Vec<String> {
        let mut kept = Vec::new();
        let mut len = 0;

        for sentence in sentences.iter().rev() {
            if len + sentence.len() > self.chunk_overlap {
                break;
            }
            len += sentence.len() + 1;
            kept.push(sentence.clone());
        }

        kept.reverse();
        kept
    }
}

fn joined_len(sentences: &[String]) -> usize {
    if sentences.is_empty() {
        0
    } else {
        sentences.iter().map(String::len).sum::<usize>() + sentences.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = SentenceChunker::new(800, 100).unwrap();
        let chunks = chunker.chunk("First sentence.  Second\nsentence!");
        assert_eq!(chunks, vec!["First sentence. Second sentence!"]);
    }

    #[test]
    fn test_chunks_respect_size_with_overlap() {
        let chunker = SentenceChunker::new(40, 20).unwrap();
        let chunks = chunker.chunk("Alpha is first. Beta is second. Gamma is third. Delta is last.");

        assert_eq!(
            chunks,
            vec![
                "Alpha is first. Beta is second.",
                "Beta is second. Gamma is third.",
                "Gamma is third. Delta is last.",
            ]
        );
        assert!(chunks.iter().all(|c| c.len() <= 40));
    }

    #[test]
    fn test_overlap_never_exceeds_chunk_size() {
        let chunker = SentenceChunker::new(40, 30).unwrap();
        let first = "Aaaaaaaaaaaaaaaaaaaaaaaa.";
        let second = "Bbbbbbbbbbbbbbbbbbbbbbbbbbbbb.";
        let chunks = chunker.chunk(&format!("{} {} Cc.", first, second));

        assert_eq!(chunks, vec![first.to_string(), format!("{} Cc.", second)]);
        assert!(chunks.iter().all(|c| c.len() <= 40));
        assert!(!chunks[1].contains(first));
    }

    #[test]
    fn test_partial_overlap_is_trimmed_from_the_front() {
        let chunker = SentenceChunker::new(16, 10).unwrap();
        let chunks = chunker.chunk("A a. B b. C c. Dddd dddd.");

        // "B b. C c." fits the overlap budget but only "C c." fits the next chunk
        assert_eq!(chunks, vec!["A a. B b. C c.", "C c. Dddd dddd."]);
    }

    #[test]
    fn test_zero_overlap() {
        let chunker = SentenceChunker::new(20, 0).unwrap();
        let chunks = chunker.chunk("One two three. Four five six. Seven.");
        assert_eq!(chunks, vec!["One two three.", "Four five six.", "Seven."]);
    }

    #[test]
    fn test_long_sentence_kept_whole() {
        let chunker = SentenceChunker::new(10, 0).unwrap();
        let chunks = chunker.chunk("This sentence is much longer than ten characters");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_blank_text() {
        let chunker = SentenceChunker::new(10, 0).unwrap();
        assert!(chunker.chunk("   \n ").is_empty());
        assert!(SentenceChunker::new(0, 0).is_err());
    }
}
