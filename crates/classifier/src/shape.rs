use {crate::session::Dim, std::fmt};

pub const DEFAULT_INPUT_SIZE: usize = 252;

/// Spatial size the model expects, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputGeometry {
    pub height: usize,
    pub width: usize,
}

impl InputGeometry {
    pub fn square(size: usize) -> Self {
        Self {
            height: size,
            width: size,
        }
    }
}

impl fmt::Display for InputGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How the geometry was read off the declared shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// `[N, 3, H, W]`
    Nchw,
    /// `[N, H, W, 3]`
    Nhwc,
    /// `[3, H, W]`
    Chw,
    /// Last two usable dimensions of an otherwise unrecognized shape.
    TrailingDims,
}

fn is_channels(dim: &Dim) -> bool {
    dim.size() == Some(3)
}

fn spatial(height: &Dim, width: &Dim) -> Option<InputGeometry> {
    Some(InputGeometry {
        height: height.size()?,
        width: width.size()?,
    })
}

/// Reads the geometry off a declared input shape.
///
/// Channel-first is checked before channel-last, so `[1, 3, 3, 3]` reads as
/// NCHW. Shapes of rank two or less are never guessed at.
pub fn geometry_from_dims(dims: &[Dim]) -> Option<(InputGeometry, Layout)> {
    match dims {
        [_, c, h, w] if is_channels(c) => {
            if let Some(geometry) = spatial(h, w) {
                return Some((geometry, Layout::Nchw));
            }
        }
        [_, h, w, c] if is_channels(c) => {
            if let Some(geometry) = spatial(h, w) {
                return Some((geometry, Layout::Nhwc));
            }
        }
        [c, h, w] if is_channels(c) => {
            if let Some(geometry) = spatial(h, w) {
                return Some((geometry, Layout::Chw));
            }
        }
        _ => {}
    }

    if dims.len() < 3 {
        return None;
    }
    let usable: Vec<usize> = dims.iter().filter_map(Dim::size).collect();
    match usable[..] {
        [.., height, width] => Some((InputGeometry { height, width }, Layout::TrailingDims)),
        _ => None,
    }
}

/// Geometry for an input, falling back to a `default_size` square.
pub fn inspect(input_name: &str, dims: Option<&[Dim]>, default_size: usize) -> InputGeometry {
    match dims.and_then(geometry_from_dims) {
        Some((geometry, Layout::TrailingDims)) => {
            log::warn!(
                "input {} has unrecognized shape {:?}, guessing {} from its trailing dimensions",
                input_name,
                dims.unwrap_or_default(),
                geometry
            );
            geometry
        }
        Some((geometry, layout)) => {
            log::debug!("input {} is {:?} {}", input_name, layout, geometry);
            geometry
        }
        None => {
            let geometry = InputGeometry::square(default_size);
            log::warn!(
                "input {} declares no usable shape ({:?}), using default {}",
                input_name,
                dims,
                geometry
            );
            geometry
        }
    }
}
