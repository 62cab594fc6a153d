//! Adapter boundary toward an external renderer.
//!
//! The core never draws. [`present`] resolves each polyline to an ordered
//! vertex list and hands it, together with the caller-selected
//! [`DrawStyle`], to a [`Renderer`] implementation living outside the crate
//! (canvas, SVG writer, test double).

use crate::polyline::Polyline;
use crate::tree::Tree;
use glam::Vec2;

/// How a renderer should treat one polyline.
///
/// One variant per supported look; the renderer dispatches on it. Decorative
/// jitter (the blob variants) is the renderer's business, including its own
/// randomness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawStyle {
    /// Stroke only.
    Line,
    /// Stroke plus a fixed-size dot per vertex.
    LineWithVertices,
    /// Stroke plus dots growing along the chain.
    Knuckles,
    /// Jittered blob per vertex, no stroke.
    Blobs,
    /// Blobs with stroke and fill.
    BlobsFilled,
    /// Blobs with translucent fill.
    BlobsTranslucent,
    /// Stroke with blobs layered on top.
    LineWithBlobs,
}

/// Receives ordered vertex sequences, one call per polyline.
pub trait Renderer {
    fn polyline(&mut self, vertices: &[Vec2], style: DrawStyle);
}

/// Resolves every polyline against the arena and forwards it to `renderer`.
pub fn present(tree: &Tree, polylines: &[Polyline], renderer: &mut dyn Renderer, style: DrawStyle) {
    let mut vertices = Vec::new();
    for poly in polylines {
        vertices.clear();
        vertices.extend(poly.vertices.iter().map(|&id| tree.pos(id)));
        renderer.polyline(&vertices, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<(Vec<Vec2>, DrawStyle)>,
    }

    impl Renderer for RecordingRenderer {
        fn polyline(&mut self, vertices: &[Vec2], style: DrawStyle) {
            self.calls.push((vertices.to_vec(), style));
        }
    }

    #[test]
    fn present_forwards_ordered_vertices_per_polyline() {
        let mut tree = Tree::new();
        let root = tree.add_root(Vec2::ZERO, Vec2::new(1.0, 0.0), 4.0);
        let a = tree.add_child(root, Vec2::new(4.0, 0.0), Vec2::new(1.0, 0.0), 4.0);
        let b = tree.add_child(a, Vec2::new(8.0, 0.0), Vec2::new(1.0, 0.0), 4.0);

        let polylines = vec![
            Polyline {
                vertices: vec![root, a, b],
            },
            Polyline {
                vertices: vec![b, a],
            },
        ];

        let mut renderer = RecordingRenderer::default();
        present(&tree, &polylines, &mut renderer, DrawStyle::Line);

        assert_eq!(renderer.calls.len(), 2);
        assert_eq!(
            renderer.calls[0].0,
            vec![Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(8.0, 0.0)]
        );
        assert_eq!(renderer.calls[1].0, vec![Vec2::new(8.0, 0.0), Vec2::new(4.0, 0.0)]);
        assert_eq!(renderer.calls[0].1, DrawStyle::Line);
    }
}
