//! Card board: identities, grid layout and hit testing.
//!
//! A board is built once per session from a shuffled identity sequence
//! `[0, 0, 1, 1, ..., P-1, P-1]` and laid out row-major on a fixed grid.
//! Card rectangles never change after construction; only card state does,
//! and only the match engine is allowed to change it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

/// Integer screen rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Half-open containment: the right and bottom edges belong to the next cell.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardState {
    HiddenUnmatched,
    Revealed,
    Matched,
}

impl CardState {
    /// Whether the renderer should show the face image for this card.
    pub fn is_face_up(self) -> bool {
        !matches!(self, Self::HiddenUnmatched)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    identity: usize,
    position: Rect,
    state: CardState,
}

impl Card {
    pub fn identity(&self) -> usize {
        self.identity
    }

    pub fn position(&self) -> Rect {
        self.position
    }

    pub fn state(&self) -> CardState {
        self.state
    }
}

/// Grid geometry and pair count. Deserialized as the `board` section of the
/// game config; every field falls back to the classic 6-pair, 4-column layout.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BoardLayout {
    pub pair_count: usize,
    pub columns: usize,
    pub card_width: i32,
    pub card_height: i32,
    pub gap: i32,
    pub margin_x: i32,
    pub margin_y: i32,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            pair_count: 6,
            columns: 4,
            card_width: 100,
            card_height: 100,
            gap: 10,
            margin_x: 50,
            margin_y: 60,
        }
    }
}

impl BoardLayout {
    pub fn card_count(&self) -> usize {
        self.pair_count.saturating_mul(2)
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            return 0;
        }
        self.card_count().div_ceil(self.columns)
    }

    /// Check the layout can be placed on an integer pixel grid without
    /// overlapping cards. Boards are only ever built from a valid layout.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.pair_count == 0 {
            return Err(BoardError::NoPairs);
        }
        if self.card_width <= 0 || self.card_height <= 0 {
            return Err(BoardError::CardSize {
                width: self.card_width,
                height: self.card_height,
            });
        }
        if self.gap < 0 || self.margin_x < 0 || self.margin_y < 0 {
            return Err(BoardError::NegativeSpacing);
        }
        self.grid_extent().map(|_| ())
    }

    /// Right/bottom edge of the occupied grid, used to check the board fits the window.
    pub fn grid_extent(&self) -> Result<(i32, i32), BoardError> {
        if self.columns == 0 {
            return Err(BoardError::NoColumns);
        }
        let overflow = || BoardError::GridOverflow {
            cards: self.card_count(),
            columns: self.columns,
        };
        let used_columns = self.columns.min(self.card_count());
        let right =
            span(self.margin_x, used_columns, self.card_width, self.gap).ok_or_else(overflow)?;
        let bottom =
            span(self.margin_y, self.rows(), self.card_height, self.gap).ok_or_else(overflow)?;
        Ok((right, bottom))
    }

    /// Rectangle for grid index `index`, row-major. Only called on a validated
    /// layout with `index < card_count()`, which keeps every coordinate inside
    /// `grid_extent()`.
    fn rect_for(&self, index: usize) -> Rect {
        let column = (index % self.columns) as i32;
        let row = (index / self.columns) as i32;
        Rect::new(
            self.margin_x + column * (self.card_width + self.gap),
            self.margin_y + row * (self.card_height + self.gap),
            self.card_width,
            self.card_height,
        )
    }
}

/// `margin + count * size + (count - 1) * gap`, or `None` if it leaves `i32`.
fn span(margin: i32, count: usize, size: i32, gap: i32) -> Option<i32> {
    let margin = i64::from(margin);
    if count == 0 {
        return i32::try_from(margin).ok();
    }
    let count = i64::try_from(count).ok()?;
    let cells = count.checked_mul(i64::from(size))?;
    let gaps = (count - 1).checked_mul(i64::from(gap))?;
    let edge = margin.checked_add(cells)?.checked_add(gaps)?;
    i32::try_from(edge).ok()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board.pair_count must be > 0")]
    NoPairs,
    #[error("board.columns must be > 0")]
    NoColumns,
    #[error("card size must be positive, got {width}x{height}")]
    CardSize { width: i32, height: i32 },
    #[error("board.gap and board margins must be >= 0")]
    NegativeSpacing,
    #[error("{cards} cards in {columns} columns do not fit in pixel coordinates")]
    GridOverflow { cards: usize, columns: usize },
    #[error("identity {identity} is out of range for {pair_count} pairs")]
    IdentityOutOfRange { identity: usize, pair_count: usize },
    #[error("identity {identity} appears {count} times, expected exactly 2")]
    UnpairedIdentity { identity: usize, count: usize },
}

/// The unshuffled identity sequence `[0, 0, 1, 1, ..., P-1, P-1]`.
pub fn identity_sequence(pair_count: usize) -> Vec<usize> {
    (0..pair_count).flat_map(|id| [id, id]).collect()
}

#[derive(Debug, Clone)]
pub struct Board {
    layout: BoardLayout,
    cards: Vec<Card>,
}

impl Board {
    /// Shuffle with the thread-local, OS-seeded generator.
    pub fn shuffled(layout: BoardLayout) -> Result<Self, BoardError> {
        Self::generate_with(layout, &mut rand::thread_rng())
    }

    /// Fisher-Yates shuffle of the identity sequence driven by `rng`.
    pub fn generate_with<R: Rng + ?Sized>(
        layout: BoardLayout,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        layout.validate()?;
        let mut identities = identity_sequence(layout.pair_count);
        identities.shuffle(rng);
        Ok(Self::lay_out(layout, identities))
    }

    /// Build a board from an explicit identity order. Every identity in
    /// `[0, pair_count)` must appear exactly twice.
    pub fn from_identities(layout: BoardLayout, identities: &[usize]) -> Result<Self, BoardError> {
        layout.validate()?;
        let mut counts = vec![0usize; layout.pair_count];
        for &identity in identities {
            let Some(count) = counts.get_mut(identity) else {
                return Err(BoardError::IdentityOutOfRange {
                    identity,
                    pair_count: layout.pair_count,
                });
            };
            *count += 1;
        }
        if let Some((identity, &count)) = counts.iter().enumerate().find(|&(_, &count)| count != 2) {
            return Err(BoardError::UnpairedIdentity { identity, count });
        }
        Ok(Self::lay_out(layout, identities.to_vec()))
    }

    fn lay_out(layout: BoardLayout, identities: Vec<usize>) -> Self {
        let cards = identities
            .into_iter()
            .enumerate()
            .map(|(index, identity)| Card {
                identity,
                position: layout.rect_for(index),
                state: CardState::HiddenUnmatched,
            })
            .collect();
        Self { layout, cards }
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// First card (in index order) whose rectangle contains the point.
    pub fn card_at(&self, x: i32, y: i32) -> Option<usize> {
        self.cards.iter().position(|card| card.position.contains(x, y))
    }

    pub fn count_in_state(&self, state: CardState) -> usize {
        self.cards.iter().filter(|card| card.state == state).count()
    }

    pub fn all_matched(&self) -> bool {
        self.cards
            .iter()
            .all(|card| card.state == CardState::Matched)
    }

    pub(crate) fn set_state(&mut self, index: usize, state: CardState) {
        let card = &mut self.cards[index];
        debug_assert!(
            card.state != CardState::Matched,
            "matched card {index} must never change state"
        );
        card.state = state;
    }
}
