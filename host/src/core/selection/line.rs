//! Rendered Caption Line
//!
//! Node model of one displayed caption line: word tokens separated by
//! whitespace nodes, plus merged units produced by completed selections.
//! Node positions play the role of DOM order.

use serde::{Deserialize, Serialize};

use super::HighlightColor;
use crate::core::captions::Cue;
use crate::core::{LineNumber, TimeSec, TokenIndex};

/// A selectable word
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordToken {
    /// Token index within the line, assigned at render time
    pub index: TokenIndex,
    pub text: String,
    /// Part of the in-progress drag range
    pub highlighted: bool,
}

/// The single node replacing a merged token run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedUnit {
    pub text: String,
    /// Originating line attribute
    pub line: LineNumber,
    /// First merged token index
    pub start: TokenIndex,
    /// Last merged token index
    pub end: TokenIndex,
    /// Merge styling
    pub color: HighlightColor,
}

/// One node of a rendered line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineNode {
    Word(WordToken),
    Space { text: String },
    Merged(MergedUnit),
}

/// A rendered caption line
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLine {
    line: LineNumber,
    cue_index: usize,
    time: TimeSec,
    nodes: Vec<LineNode>,
}

impl CaptionLine {
    /// Renders `cue` (at `cue_index` in the sorted cue list) into word tokens.
    ///
    /// The line number is the cue's sequence number, or its 1-based index.
    pub fn from_cue(cue_index: usize, cue: &Cue) -> Self {
        let line = cue
            .sequence_number
            .unwrap_or_else(|| u32::try_from(cue_index + 1).unwrap_or(u32::MAX));

        Self {
            line,
            cue_index,
            time: cue.start,
            nodes: tokenize(&cue.text),
        }
    }

    pub fn line(&self) -> LineNumber {
        self.line
    }

    pub fn cue_index(&self) -> usize {
        self.cue_index
    }

    /// Absolute time of the displayed cue
    pub fn time(&self) -> TimeSec {
        self.time
    }

    pub fn nodes(&self) -> &[LineNode] {
        &self.nodes
    }

    /// Number of selectable (unmerged) word tokens
    pub fn token_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, LineNode::Word(_)))
            .count()
    }

    /// Resolves the node at `position` to a selectable token.
    ///
    /// Whitespace and merged units never hit.
    pub fn hit_test(&self, position: usize) -> Option<TokenIndex> {
        match self.nodes.get(position)? {
            LineNode::Word(word) => Some(word.index),
            _ => None,
        }
    }

    /// Node position of a selectable token
    pub fn position_of(&self, token: TokenIndex) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| matches!(node, LineNode::Word(word) if word.index == token))
    }

    pub fn word(&self, token: TokenIndex) -> Option<&WordToken> {
        self.nodes.iter().find_map(|node| match node {
            LineNode::Word(word) if word.index == token => Some(word),
            _ => None,
        })
    }

    /// Tokens currently highlighted, in DOM order
    pub fn highlighted(&self) -> Vec<TokenIndex> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                LineNode::Word(word) if word.highlighted => Some(word.index),
                _ => None,
            })
            .collect()
    }

    /// Merged units, in DOM order
    pub fn merged_units(&self) -> Vec<&MergedUnit> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                LineNode::Merged(unit) => Some(unit),
                _ => None,
            })
            .collect()
    }

    /// Selectable tokens contiguous with `anchor`, in DOM order.
    ///
    /// The run stops at merged units on either side so that a selection
    /// never spans one.
    pub fn selectable_run(&self, anchor: TokenIndex) -> Vec<TokenIndex> {
        let Some(anchor_pos) = self.position_of(anchor) else {
            return Vec::new();
        };

        let first = self.nodes[..anchor_pos]
            .iter()
            .rposition(|node| matches!(node, LineNode::Merged(_)))
            .map_or(0, |pos| pos + 1);
        let last = self.nodes[anchor_pos..]
            .iter()
            .position(|node| matches!(node, LineNode::Merged(_)))
            .map_or(self.nodes.len(), |offset| anchor_pos + offset);

        self.nodes[first..last]
            .iter()
            .filter_map(|node| match node {
                LineNode::Word(word) => Some(word.index),
                _ => None,
            })
            .collect()
    }

    /// Plain text as currently displayed
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .map(|node| match node {
                LineNode::Word(word) => word.text.as_str(),
                LineNode::Space { text } => text.as_str(),
                LineNode::Merged(unit) => unit.text.as_str(),
            })
            .collect()
    }

    pub(crate) fn set_highlight(&mut self, token: TokenIndex, highlighted: bool) {
        for node in &mut self.nodes {
            if let LineNode::Word(word) = node {
                if word.index == token {
                    word.highlighted = highlighted;
                    return;
                }
            }
        }
    }

    pub(crate) fn clear_highlights(&mut self) {
        for node in &mut self.nodes {
            if let LineNode::Word(word) = node {
                word.highlighted = false;
            }
        }
    }

    /// Replaces the node run spanning `tokens` (DOM-ordered, contiguous)
    /// with one merged unit, including the whitespace between them.
    pub(crate) fn merge(
        &mut self,
        tokens: &[TokenIndex],
        color: HighlightColor,
    ) -> Option<MergedUnit> {
        let (&start, &end) = (tokens.first()?, tokens.last()?);
        let first_pos = self.position_of(start)?;
        let last_pos = self.position_of(end)?;
        if last_pos < first_pos {
            return None;
        }

        let text = tokens
            .iter()
            .filter_map(|&token| self.word(token).map(|word| word.text.as_str()))
            .collect::<Vec<_>>()
            .join(" ");

        let unit = MergedUnit {
            text,
            line: self.line,
            start,
            end,
            color,
        };
        self.nodes
            .splice(first_pos..=last_pos, [LineNode::Merged(unit.clone())]);
        Some(unit)
    }
}

fn tokenize(text: &str) -> Vec<LineNode> {
    let mut nodes = Vec::new();
    let mut current = String::new();
    let mut current_is_space = false;
    let mut next_index: TokenIndex = 0;

    let mut flush = |buffer: &mut String, is_space: bool, nodes: &mut Vec<LineNode>| {
        if buffer.is_empty() {
            return;
        }
        let text = std::mem::take(buffer);
        if is_space {
            nodes.push(LineNode::Space { text });
        } else {
            nodes.push(LineNode::Word(WordToken {
                index: next_index,
                text,
                highlighted: false,
            }));
            next_index += 1;
        }
    };

    for ch in text.chars() {
        let is_space = ch.is_whitespace();
        if is_space != current_is_space {
            flush(&mut current, current_is_space, &mut nodes);
            current_is_space = is_space;
        }
        current.push(ch);
    }
    flush(&mut current, current_is_space, &mut nodes);

    nodes
}
