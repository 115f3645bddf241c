//! Robot sides and per-side storage.
//!
//! `Side` is a closed two-value enum; `SideMap<T>` is a fixed 2-element
//! array indexed by it. `FeetInContact` is the bitflag set of sides
//! currently touching the ground.

use core::ops::{Index, IndexMut};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Robot side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    /// Both sides, in index order.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Fixed per-side storage, indexed by [`Side`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SideMap<T> {
    values: [T; 2],
}

impl<T> SideMap<T> {
    pub const fn new(left: T, right: T) -> Self {
        Self {
            values: [left, right],
        }
    }

    /// Build a map by evaluating `f` once per side.
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self::new(f(Side::Left), f(Side::Right))
    }

    /// Iterate `(side, &value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Side, &T) -> U) -> SideMap<U> {
        SideMap::new(
            f(Side::Left, &self.values[0]),
            f(Side::Right, &self.values[1]),
        )
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, side: Side) -> &T {
        &self.values[side.index()]
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    #[inline]
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self.values[side.index()]
    }
}

bitflags! {
    /// Set of feet currently in ground contact.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeetInContact: u8 {
        const LEFT  = 0x01;
        const RIGHT = 0x02;
        const BOTH  = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl Default for FeetInContact {
    fn default() -> Self {
        Self::empty()
    }
}

impl FeetInContact {
    /// Flag corresponding to a single side.
    #[inline]
    pub const fn from_side(side: Side) -> Self {
        match side {
            Side::Left => Self::LEFT,
            Side::Right => Self::RIGHT,
        }
    }

    #[inline]
    pub const fn contains_side(&self, side: Side) -> bool {
        self.contains(Self::from_side(side))
    }

    #[inline]
    pub fn insert_side(&mut self, side: Side) {
        self.insert(Self::from_side(side));
    }

    #[inline]
    pub fn remove_side(&mut self, side: Side) {
        self.remove(Self::from_side(side));
    }

    /// Number of feet in contact (0, 1 or 2).
    #[inline]
    pub const fn count(&self) -> u32 {
        self.bits().count_ones()
    }

    #[inline]
    pub const fn is_double_support(&self) -> bool {
        self.count() == 2
    }

    #[inline]
    pub const fn is_single_support(&self) -> bool {
        self.count() == 1
    }

    /// Sides in contact, in index order.
    pub fn sides(&self) -> impl Iterator<Item = Side> + '_ {
        Side::ALL.into_iter().filter(|s| self.contains_side(*s))
    }
}
