use crate::math::{Float, Vector2};
use crate::spectrum::{CoefficientSpectrum, RgbSpectrum};

use super::texture::{TextureId, TextureTable};

/// Binary operators available to a [`ValueNode::Binary`], mirroring the
/// teacher's `sdl_binary_operator.cpp` channel-wise arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Divide,
}

/// Unary operators for [`ValueNode::Unary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Sqrt,
    Abs,
}

/// Which component a [`ValueNode::VectorSplit`] extracts (replicated
/// across all three output channels, so the result can itself feed
/// another colour-valued node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
}

/// A small, acyclic expression graph producing an RGB value at a
/// surface point — the "value nodes" §3/§4.4 attach to BSDF
/// diffuse/specular inputs. Owned directly by the `Bsdf` that
/// references it (no arena needed: the graph is a tree, never shared
/// or cyclic, per the redesign note in §9 about avoiding intrusive
/// cyclic node graphs).
#[derive(Debug, Clone)]
pub enum ValueNode {
    Constant(RgbSpectrum),
    Texture(TextureId),
    Binary(BinaryOp, Box<ValueNode>, Box<ValueNode>),
    Unary(UnaryOp, Box<ValueNode>),
    Multiply(Box<ValueNode>, Box<ValueNode>),
    /// Piecewise-linear colour ramp keyed by the luminance of `input`.
    Ramp {
        stops: Vec<(Float, RgbSpectrum)>,
        input: Box<ValueNode>,
    },
    /// Wraps/scales the UV coordinate before evaluating `input`'s
    /// texture lookups.
    UvWrap {
        scale: Vector2,
        offset: Vector2,
        input: Box<ValueNode>,
    },
    VectorSplit(Channel, Box<ValueNode>),
}

impl ValueNode {
    pub fn constant(v: RgbSpectrum) -> ValueNode {
        ValueNode::Constant(v)
    }

    /// Evaluates the graph at `uv` against a texture table; constant
    /// and arithmetic nodes ignore `uv` except where it threads through
    /// a `UvWrap` into a `Texture` leaf.
    pub fn evaluate(&self, uv: Vector2, textures: &TextureTable) -> RgbSpectrum {
        match self {
            ValueNode::Constant(v) => *v,
            ValueNode::Texture(id) => textures.get(*id).sample(uv),
            ValueNode::Binary(op, a, b) => {
                let a = a.evaluate(uv, textures);
                let b = b.evaluate(uv, textures);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Subtract => a - b,
                    BinaryOp::Divide => RgbSpectrum::new(
                        safe_div(a.r(), b.r()),
                        safe_div(a.g(), b.g()),
                        safe_div(a.b(), b.b()),
                    ),
                }
            }
            ValueNode::Unary(op, a) => {
                let a = a.evaluate(uv, textures);
                match op {
                    UnaryOp::Negate => RgbSpectrum::new(-a.r(), -a.g(), -a.b()),
                    UnaryOp::Sqrt => {
                        RgbSpectrum::new(a.r().max(0.0).sqrt(), a.g().max(0.0).sqrt(), a.b().max(0.0).sqrt())
                    }
                    UnaryOp::Abs => RgbSpectrum::new(a.r().abs(), a.g().abs(), a.b().abs()),
                }
            }
            ValueNode::Multiply(a, b) => a.evaluate(uv, textures) * b.evaluate(uv, textures),
            ValueNode::Ramp { stops, input } => {
                let t = input.evaluate(uv, textures).luminance();
                ramp_sample(stops, t)
            }
            ValueNode::UvWrap { scale, offset, input } => {
                let wrapped = Vector2::new(uv.x * scale.x + offset.x, uv.y * scale.y + offset.y);
                input.evaluate(wrapped, textures)
            }
            ValueNode::VectorSplit(channel, input) => {
                let v = input.evaluate(uv, textures);
                let scalar = match channel {
                    Channel::R => v.r(),
                    Channel::G => v.g(),
                    Channel::B => v.b(),
                };
                RgbSpectrum::gray(scalar)
            }
        }
    }
}

fn safe_div(a: Float, b: Float) -> Float {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

fn ramp_sample(stops: &[(Float, RgbSpectrum)], t: Float) -> RgbSpectrum {
    if stops.is_empty() {
        return RgbSpectrum::ZERO;
    }
    if t <= stops[0].0 {
        return stops[0].1;
    }
    for w in stops.windows(2) {
        let (t0, c0) = w[0];
        let (t1, c1) = w[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return RgbSpectrum::new(
                crate::math::lerp(f, c0.r(), c1.r()),
                crate::math::lerp(f, c0.g(), c1.g()),
                crate::math::lerp(f, c0.b(), c1.b()),
            );
        }
    }
    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_node_ignores_uv() {
        let node = ValueNode::constant(RgbSpectrum::new(0.2, 0.3, 0.4));
        let textures = TextureTable::new();
        let a = node.evaluate(Vector2::new(0.0, 0.0), &textures);
        let b = node.evaluate(Vector2::new(0.9, 0.1), &textures);
        assert_eq!(a, b);
    }

    #[test]
    fn multiply_scales_channels() {
        let a = ValueNode::constant(RgbSpectrum::new(0.5, 0.5, 0.5));
        let b = ValueNode::constant(RgbSpectrum::new(2.0, 2.0, 2.0));
        let node = ValueNode::Multiply(Box::new(a), Box::new(b));
        let textures = TextureTable::new();
        let v = node.evaluate(Vector2::new(0.0, 0.0), &textures);
        assert!((v.r() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ramp_interpolates_between_stops() {
        let stops = vec![
            (0.0, RgbSpectrum::new(0.0, 0.0, 0.0)),
            (1.0, RgbSpectrum::new(1.0, 1.0, 1.0)),
        ];
        let input = ValueNode::constant(RgbSpectrum::gray(0.5));
        let node = ValueNode::Ramp { stops, input: Box::new(input) };
        let textures = TextureTable::new();
        let v = node.evaluate(Vector2::new(0.0, 0.0), &textures);
        assert!((v.r() - 0.5).abs() < 1e-2);
    }
}
