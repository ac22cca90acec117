#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[cfg(test)]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[cfg(test)]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[cfg(test)]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_rectangles_do_not_intersect() {
        let left = Rectangle::new(0, 0, 100, 100);
        let right = Rectangle::new(100, 0, 100, 100);
        assert!(!left.intersects(&right));
        assert!(!right.intersects(&left));
    }

    #[test]
    fn test_overlap() {
        let a = Rectangle::new(0, 0, 100, 100);
        let b = Rectangle::new(99, 99, 10, 10);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_is_empty() {
        assert!(Rectangle::new(5, 5, 0, 10).is_empty());
        assert!(Rectangle::new(5, 5, 10, -1).is_empty());
        assert!(!Rectangle::new(5, 5, 1, 1).is_empty());
    }
}
