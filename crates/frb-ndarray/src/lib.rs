#![forbid(unsafe_code)]

//! A minimal strided `float64` array: a flat buffer viewed through a shape,
//! per-axis element strides and an offset. It is the subject of the ndarray
//! accessor benchmarks, so accessors stay allocation-free.

pub const BYTES_PER_ELEMENT: usize = 8;
pub const DTYPE: &str = "float64";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOrder {
    C,
    F,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("item size must be > 0")]
    InvalidItemSize,
    #[error("size arithmetic overflow")]
    Overflow,
    #[error("expected {expected} subscripts, got {actual}")]
    RankMismatch { expected: usize, actual: usize },
    #[error("index {index} out of bounds for axis {axis} with size {dim}")]
    IndexOutOfBounds { axis: usize, index: usize, dim: usize },
    #[error("linear index {index} out of bounds for {len} elements")]
    LinearIndexOutOfBounds { index: usize, len: usize },
    #[error("view reaches buffer index {required} but buffer has {available} elements")]
    BufferTooSmall { required: isize, available: usize },
    #[error("view reaches negative buffer index {lowest}")]
    NegativeExtent { lowest: isize },
}

impl ShapeError {
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidItemSize | Self::Overflow => "shape_arithmetic_invalid",
            Self::RankMismatch { .. } => "shape_rank_mismatch",
            Self::IndexOutOfBounds { .. } | Self::LinearIndexOutOfBounds { .. } => {
                "shape_index_out_of_bounds"
            }
            Self::BufferTooSmall { .. } | Self::NegativeExtent { .. } => {
                "shape_view_out_of_buffer"
            }
        }
    }
}

pub fn element_count(shape: &[usize]) -> Result<usize, ShapeError> {
    shape.iter().try_fold(1usize, |acc, &dim| {
        acc.checked_mul(dim).ok_or(ShapeError::Overflow)
    })
}

pub fn contiguous_strides(
    shape: &[usize],
    item_size: usize,
    order: MemoryOrder,
) -> Result<Vec<isize>, ShapeError> {
    if item_size == 0 {
        return Err(ShapeError::InvalidItemSize);
    }

    let mut strides = vec![0usize; shape.len()];

    match order {
        MemoryOrder::C => {
            let mut stride = item_size;
            for (i, &dim) in shape.iter().enumerate().rev() {
                strides[i] = stride;
                stride = stride.checked_mul(dim).ok_or(ShapeError::Overflow)?;
            }
        }
        MemoryOrder::F => {
            let mut stride = item_size;
            for (i, &dim) in shape.iter().enumerate() {
                strides[i] = stride;
                stride = stride.checked_mul(dim).ok_or(ShapeError::Overflow)?;
            }
        }
    }

    strides
        .into_iter()
        .map(|s| isize::try_from(s).map_err(|_| ShapeError::Overflow))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayFlags {
    pub c_contiguous: bool,
    pub f_contiguous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StridedArray {
    buffer: Vec<f64>,
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: MemoryOrder,
}

impl StridedArray {
    /// Views `buffer` through `shape`/`strides` (in elements) from `offset`.
    /// Every reachable element must lie inside the buffer.
    pub fn new(
        buffer: Vec<f64>,
        shape: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        order: MemoryOrder,
    ) -> Result<Self, ShapeError> {
        if strides.len() != shape.len() {
            return Err(ShapeError::RankMismatch {
                expected: shape.len(),
                actual: strides.len(),
            });
        }

        if element_count(&shape)? > 0 {
            let base = isize::try_from(offset).map_err(|_| ShapeError::Overflow)?;
            let (mut lowest, mut highest) = (base, base);
            for (&dim, &stride) in shape.iter().zip(&strides) {
                let span = isize::try_from(dim - 1)
                    .ok()
                    .and_then(|d| d.checked_mul(stride))
                    .ok_or(ShapeError::Overflow)?;
                if span >= 0 {
                    highest = highest.checked_add(span).ok_or(ShapeError::Overflow)?;
                } else {
                    lowest = lowest.checked_add(span).ok_or(ShapeError::Overflow)?;
                }
            }
            if lowest < 0 {
                return Err(ShapeError::NegativeExtent { lowest });
            }
            if highest >= buffer.len() as isize {
                return Err(ShapeError::BufferTooSmall {
                    required: highest,
                    available: buffer.len(),
                });
            }
        }

        Ok(Self {
            buffer,
            shape,
            strides,
            offset,
            order,
        })
    }

    pub fn contiguous(
        buffer: Vec<f64>,
        shape: Vec<usize>,
        order: MemoryOrder,
    ) -> Result<Self, ShapeError> {
        let strides = contiguous_strides(&shape, 1, order)?;
        Self::new(buffer, shape, strides, 0, order)
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.buffer
    }

    #[must_use]
    pub fn dtype(&self) -> &'static str {
        DTYPE
    }

    #[must_use]
    pub fn flags(&self) -> ArrayFlags {
        let matches = |order| {
            contiguous_strides(&self.shape, 1, order).is_ok_and(|s| s == self.strides)
        };
        ArrayFlags {
            c_contiguous: matches(MemoryOrder::C),
            f_contiguous: matches(MemoryOrder::F),
        }
    }

    /// Number of elements in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn bytes_per_element(&self) -> usize {
        BYTES_PER_ELEMENT
    }

    #[must_use]
    pub fn byte_length(&self) -> usize {
        self.len() * BYTES_PER_ELEMENT
    }

    #[must_use]
    pub fn ndims(&self) -> usize {
        self.shape.len()
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn order(&self) -> MemoryOrder {
        self.order
    }

    fn buffer_index(&self, subscripts: &[usize]) -> Result<usize, ShapeError> {
        if subscripts.len() != self.shape.len() {
            return Err(ShapeError::RankMismatch {
                expected: self.shape.len(),
                actual: subscripts.len(),
            });
        }
        let mut idx = self.offset as isize;
        for (axis, ((&sub, &dim), &stride)) in subscripts
            .iter()
            .zip(&self.shape)
            .zip(&self.strides)
            .enumerate()
        {
            if sub >= dim {
                return Err(ShapeError::IndexOutOfBounds {
                    axis,
                    index: sub,
                    dim,
                });
            }
            // In range by the extent check in `new`.
            idx += sub as isize * stride;
        }
        Ok(idx as usize)
    }

    fn linear_buffer_index(&self, index: usize) -> Result<usize, ShapeError> {
        let len = self.len();
        if index >= len {
            return Err(ShapeError::LinearIndexOutOfBounds { index, len });
        }
        let mut rem = index;
        let mut idx = self.offset as isize;
        let mut visit = |dim: usize, stride: isize| {
            let sub = rem % dim;
            rem /= dim;
            idx += sub as isize * stride;
        };
        match self.order {
            MemoryOrder::C => {
                for (&dim, &stride) in self.shape.iter().zip(&self.strides).rev() {
                    visit(dim, stride);
                }
            }
            MemoryOrder::F => {
                for (&dim, &stride) in self.shape.iter().zip(&self.strides) {
                    visit(dim, stride);
                }
            }
        }
        Ok(idx as usize)
    }

    pub fn get(&self, subscripts: &[usize]) -> Result<f64, ShapeError> {
        Ok(self.buffer[self.buffer_index(subscripts)?])
    }

    pub fn set(&mut self, subscripts: &[usize], value: f64) -> Result<(), ShapeError> {
        let idx = self.buffer_index(subscripts)?;
        self.buffer[idx] = value;
        Ok(())
    }

    /// Element at `index` when the view is traversed in its memory order.
    pub fn iget(&self, index: usize) -> Result<f64, ShapeError> {
        Ok(self.buffer[self.linear_buffer_index(index)?])
    }

    pub fn iset(&mut self, index: usize, value: f64) -> Result<(), ShapeError> {
        let idx = self.linear_buffer_index(index)?;
        self.buffer[idx] = value;
        Ok(())
    }
}
