//! CPU-side mesh for the board: one textured quad per card, rebuilt every frame.
//!
//! Each card shows the shared back texture while hidden and its identity's
//! face texture otherwise. Quads are emitted in grid index order and
//! consecutive quads that share a texture collapse into one draw call.

use flip_core::board::{Board, Card};
use flip_render::vertex::QUAD_INDICES;
use flip_render::SpriteVertex;

const CARD_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Back,
    Face(usize),
}

impl TextureSlot {
    pub fn for_card(card: &Card) -> Self {
        if card.state().is_face_up() {
            Self::Face(card.identity())
        } else {
            Self::Back
        }
    }
}

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub slot: TextureSlot,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Default)]
pub struct BoardMesh {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

pub fn build_board_mesh(board: &Board) -> BoardMesh {
    let mut mesh = BoardMesh {
        vertices: Vec::with_capacity(board.cards().len() * 4),
        indices: Vec::with_capacity(board.cards().len() * 6),
        draw_calls: Vec::with_capacity(board.cards().len()),
    };

    for card in board.cards() {
        let rect = card.position();
        let base_index = mesh.vertices.len() as u32;
        mesh.vertices.extend_from_slice(&SpriteVertex::quad(
            rect.x as f32,
            rect.y as f32,
            rect.w as f32,
            rect.h as f32,
            CARD_TINT,
        ));

        let draw_start = mesh.indices.len() as u32;
        mesh.indices
            .extend(QUAD_INDICES.iter().map(|offset| base_index + offset));
        push_draw_call(
            &mut mesh.draw_calls,
            TextureSlot::for_card(card),
            draw_start,
            QUAD_INDICES.len() as u32,
        );
    }

    mesh
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous.
pub fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    slot: TextureSlot,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.slot == slot && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        slot,
        index_start,
        index_count,
    });
}

/// sRGB background color to the linear clear color an sRGB surface expects.
pub fn clear_color(rgb: [u8; 3]) -> wgpu::Color {
    fn to_linear(channel: u8) -> f64 {
        let c = f64::from(channel) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    wgpu::Color {
        r: to_linear(rgb[0]),
        g: to_linear(rgb[1]),
        b: to_linear(rgb[2]),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flip_core::board::BoardLayout;
    use flip_core::engine::MatchEngine;

    fn board(identities: &[usize]) -> Board {
        let layout = BoardLayout {
            pair_count: identities.len() / 2,
            ..BoardLayout::default()
        };
        Board::from_identities(layout, identities).expect("valid board")
    }

    fn click_card(engine: &mut MatchEngine, index: usize) {
        let rect = engine.board().cards()[index].position();
        engine.handle_click(rect.x + 1, rect.y + 1, 0);
    }

    #[test]
    fn hidden_board_is_one_back_draw_call() {
        let board = board(&[0, 1, 2, 0, 1, 2]);
        let mesh = build_board_mesh(&board);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(
            mesh.draw_calls,
            vec![DrawCall {
                slot: TextureSlot::Back,
                index_start: 0,
                index_count: 36,
            }]
        );
    }

    #[test]
    fn quads_sit_on_card_rectangles() {
        let board = board(&[0, 0]);
        let mesh = build_board_mesh(&board);
        let rect = board.cards()[1].position();
        assert_eq!(mesh.vertices[4].position, [rect.x as f32, rect.y as f32]);
        assert_eq!(
            mesh.vertices[6].position,
            [rect.right() as f32, rect.bottom() as f32]
        );
        assert_eq!(&mesh.indices[6..12], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn revealed_cards_use_their_face_texture() {
        let mut engine = MatchEngine::new(board(&[0, 1, 2, 0, 1, 2]), 1000);
        click_card(&mut engine, 1);
        click_card(&mut engine, 2);

        let mesh = build_board_mesh(engine.board());
        let slots: Vec<TextureSlot> = mesh.draw_calls.iter().map(|d| d.slot).collect();
        assert_eq!(
            slots,
            vec![
                TextureSlot::Back,
                TextureSlot::Face(1),
                TextureSlot::Face(2),
                TextureSlot::Back,
            ]
        );
        assert_eq!(mesh.draw_calls[3].index_start, 18);
        assert_eq!(mesh.draw_calls[3].index_count, 18);
    }

    #[test]
    fn matched_cards_stay_face_up() {
        let mut engine = MatchEngine::new(board(&[0, 0, 1, 1]), 1000);
        click_card(&mut engine, 0);
        click_card(&mut engine, 1);
        engine.tick(1000);

        let mesh = build_board_mesh(engine.board());
        assert_eq!(mesh.draw_calls[0].slot, TextureSlot::Face(0));
        assert_eq!(mesh.draw_calls[0].index_count, 12);
        assert_eq!(mesh.draw_calls[1].slot, TextureSlot::Back);
    }

    #[test]
    fn push_draw_call_does_not_merge_gaps() {
        let mut calls = Vec::new();
        push_draw_call(&mut calls, TextureSlot::Back, 0, 6);
        push_draw_call(&mut calls, TextureSlot::Back, 12, 6);
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn clear_color_keeps_white_and_black() {
        let white = clear_color([255, 255, 255]);
        assert!((white.r - 1.0).abs() < 1e-9 && (white.b - 1.0).abs() < 1e-9);
        let black = clear_color([0, 0, 0]);
        assert_eq!((black.r, black.g, black.b, black.a), (0.0, 0.0, 0.0, 1.0));
    }
}
