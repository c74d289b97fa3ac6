use crate::math::Vector3;

/// Local surface frame whose Z axis is the shading normal (§4.4): every
/// BSDF operation works in this space so `cos theta = w.z`.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub x: Vector3,
    pub y: Vector3,
    pub z: Vector3,
}

impl Frame {
    pub fn from_normal(n: Vector3) -> Frame {
        let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        let x = Vector3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let y = Vector3::new(b, sign + n.y * n.y * a, -n.y);
        Frame { x, y, z: n }
    }

    pub fn to_local(&self, v: Vector3) -> Vector3 {
        Vector3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    pub fn to_world(&self, v: Vector3) -> Vector3 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }
}

pub fn cos_theta(w: Vector3) -> crate::math::Float {
    w.z
}

pub fn abs_cos_theta(w: Vector3) -> crate::math::Float {
    w.z.abs()
}

pub fn same_hemisphere(a: Vector3, b: Vector3) -> bool {
    a.z * b.z > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_world_to_local_and_back() {
        let n = Vector3::new(0.0, 0.0, 1.0).normalized();
        let frame = Frame::from_normal(n);
        let v = Vector3::new(0.3, -0.4, 0.8).normalized();
        let local = frame.to_local(v);
        let world = frame.to_world(local);
        assert!((world - v).length() < 1e-5);
    }

    #[test]
    fn frame_axes_are_orthonormal() {
        let n = Vector3::new(0.2, 0.9, 0.3).normalized();
        let frame = Frame::from_normal(n);
        assert!(frame.x.dot(frame.y).abs() < 1e-5);
        assert!(frame.x.dot(frame.z).abs() < 1e-5);
        assert!((frame.x.length() - 1.0).abs() < 1e-5);
    }
}
