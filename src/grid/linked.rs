//! Row-major linked grid of fragments.
//!
//! Nodes live in an arena and link to each other by index. Node 0 is a
//! sentinel whose `next` is the first fragment, so splicing at the grid's
//! start needs no special case. The last node of every row carries the
//! line-end marker, which is how traversals know where a row wraps.

use crate::core::{constants::FRAGMENT_SIZE, geo::FragmentCoord};
use crate::fragment::fragment::Fragment;
use crate::grid::iter::GridIter;
use crate::tiles::provider::FragmentProvider;

pub(crate) type NodeId = usize;

pub(crate) const SENTINEL: NodeId = 0;

/// Which side of the grid an edge operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEdge {
    /// First column (left) or first row (top)
    Start,
    /// Last column (right) or last row (bottom)
    End,
}

#[derive(Debug)]
pub(crate) struct Node<F> {
    pub(crate) fragment: Option<F>,
    pub(crate) next: Option<NodeId>,
    /// Predecessor; the sentinel for the first fragment
    pub(crate) prev: NodeId,
    pub(crate) end_of_line: bool,
}

impl<F> Node<F> {
    fn vacant() -> Self {
        Self {
            fragment: None,
            next: None,
            prev: SENTINEL,
            end_of_line: false,
        }
    }
}

/// Number of rows and columns currently linked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

impl GridDimensions {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn area(&self) -> usize {
        self.rows * self.cols
    }
}

#[derive(Debug)]
pub struct FragmentGrid<F> {
    nodes: Vec<Node<F>>,
    free: Vec<NodeId>,
    tail: Option<NodeId>,
    rows: usize,
    cols: usize,
}

impl<F: Fragment> FragmentGrid<F> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::vacant()],
            free: Vec::new(),
            tail: None,
            rows: 0,
            cols: 0,
        }
    }

    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions::new(self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[SENTINEL].next.is_none()
    }

    /// Row-major traversal starting after the sentinel
    pub fn iter(&self) -> GridIter<'_, F> {
        GridIter::new(&self.nodes, self.nodes[SENTINEL].next)
    }

    pub fn first(&self) -> Option<&F> {
        self.nodes[SENTINEL]
            .next
            .map(|id| self.fragment(id))
    }

    pub fn last(&self) -> Option<&F> {
        self.tail.map(|id| self.fragment(id))
    }

    /// Resident fragment with the given origin
    pub fn find(&self, coord: FragmentCoord) -> Option<&F> {
        self.iter()
            .map(|cell| cell.fragment)
            .find(|fragment| fragment.coord() == coord)
    }

    /// Seeds an empty grid with a single fragment
    pub fn init<P>(&mut self, coord: FragmentCoord, provider: &mut P)
    where
        P: FragmentProvider<Fragment = F>,
    {
        assert!(self.is_empty(), "grid must be empty before it is seeded");
        let id = self.alloc(provider.request_fragment(coord));
        self.nodes[id].end_of_line = true;
        self.insert_after(SENTINEL, id);
        self.rows = 1;
        self.cols = 1;
    }

    pub fn add_column<P>(&mut self, edge: GridEdge, provider: &mut P)
    where
        P: FragmentProvider<Fragment = F>,
    {
        assert!(!self.is_empty(), "cannot add a column to an empty grid");
        match edge {
            GridEdge::Start => {
                let x = self.first_coord().x - FRAGMENT_SIZE;
                for row_start in self.row_starts() {
                    let y = self.fragment(row_start).coord().y;
                    let before = self.nodes[row_start].prev;
                    let id = self.alloc(provider.request_fragment(FragmentCoord::new(x, y)));
                    self.insert_after(before, id);
                }
            }
            GridEdge::End => {
                for row_end in self.row_ends() {
                    let coord = self.fragment(row_end).coord().offset(1, 0);
                    let id = self.alloc(provider.request_fragment(coord));
                    self.insert_after(row_end, id);
                    self.nodes[row_end].end_of_line = false;
                    self.nodes[id].end_of_line = true;
                }
            }
        }
        self.cols += 1;
    }

    pub fn remove_column<P>(&mut self, edge: GridEdge, provider: &mut P)
    where
        P: FragmentProvider<Fragment = F>,
    {
        assert!(self.cols > 1, "cannot remove the only column");
        match edge {
            GridEdge::Start => {
                for row_start in self.row_starts() {
                    let fragment = self.unlink(row_start);
                    provider.recycle_fragment(fragment);
                }
            }
            GridEdge::End => {
                for row_end in self.row_ends() {
                    let before = self.nodes[row_end].prev;
                    self.nodes[before].end_of_line = true;
                    let fragment = self.unlink(row_end);
                    provider.recycle_fragment(fragment);
                }
            }
        }
        self.cols -= 1;
    }

    pub fn add_row<P>(&mut self, edge: GridEdge, provider: &mut P)
    where
        P: FragmentProvider<Fragment = F>,
    {
        assert!(!self.is_empty(), "cannot add a row to an empty grid");
        let first = self.first_coord();
        let (y, mut before) = match edge {
            GridEdge::Start => (first.y - FRAGMENT_SIZE, SENTINEL),
            GridEdge::End => {
                let last = self.tail_id();
                (self.fragment(last).coord().y + FRAGMENT_SIZE, last)
            }
        };

        let row_start = FragmentCoord::new(first.x, y);
        for col in 0..self.cols {
            let id = self.alloc(provider.request_fragment(row_start.offset(col as i64, 0)));
            self.insert_after(before, id);
            before = id;
        }
        self.nodes[before].end_of_line = true;
        self.rows += 1;
    }

    pub fn remove_row<P>(&mut self, edge: GridEdge, provider: &mut P)
    where
        P: FragmentProvider<Fragment = F>,
    {
        assert!(self.rows > 1, "cannot remove the only row");
        for _ in 0..self.cols {
            let id = match edge {
                GridEdge::Start => self.head_id(),
                GridEdge::End => self.tail_id(),
            };
            let fragment = self.unlink(id);
            provider.recycle_fragment(fragment);
        }
        self.rows -= 1;
    }

    /// Returns every fragment to the provider, front to back
    pub fn clear<P>(&mut self, provider: &mut P)
    where
        P: FragmentProvider<Fragment = F>,
    {
        while let Some(id) = self.nodes[SENTINEL].next {
            let fragment = self.unlink(id);
            provider.recycle_fragment(fragment);
        }
        self.rows = 0;
        self.cols = 0;
        self.nodes.truncate(1);
        self.free.clear();
    }

    /// Checks the structural invariants, returning a description of the
    /// first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return if self.rows == 0 && self.cols == 0 && self.tail.is_none() {
                Ok(())
            } else {
                Err(format!("empty grid reports {}x{}", self.rows, self.cols))
            };
        }

        let first = self.first_coord();
        let mut row = 0usize;
        let mut col = 0usize;
        let mut prev = SENTINEL;
        let mut cursor = self.nodes[SENTINEL].next;
        let mut last = SENTINEL;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.prev != prev {
                return Err(format!("node {id} has predecessor {} instead of {prev}", node.prev));
            }
            let expected = first.offset(col as i64, row as i64);
            if self.fragment(id).coord() != expected {
                return Err(format!(
                    "fragment {} sits where {} was expected",
                    self.fragment(id).coord(),
                    expected
                ));
            }
            if node.end_of_line {
                if col + 1 != self.cols {
                    return Err(format!("row {row} ends after {} columns", col + 1));
                }
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
            prev = id;
            last = id;
            cursor = node.next;
        }

        if col != 0 {
            return Err("last row has no line-end marker".to_string());
        }
        if row != self.rows {
            return Err(format!("{row} line-end markers for {} rows", self.rows));
        }
        if self.tail != Some(last) {
            return Err("tail does not point at the last fragment".to_string());
        }
        Ok(())
    }

    pub(crate) fn fragment(&self, id: NodeId) -> &F {
        match &self.nodes[id].fragment {
            Some(fragment) => fragment,
            None => panic!("grid node {id} holds no fragment"),
        }
    }

    fn first_coord(&self) -> FragmentCoord {
        self.fragment(self.head_id()).coord()
    }

    fn head_id(&self) -> NodeId {
        match self.nodes[SENTINEL].next {
            Some(id) => id,
            None => panic!("grid is empty"),
        }
    }

    fn tail_id(&self) -> NodeId {
        match self.tail {
            Some(id) => id,
            None => panic!("grid is empty"),
        }
    }

    fn row_starts(&self) -> Vec<NodeId> {
        let mut starts = Vec::with_capacity(self.rows);
        let mut at_row_start = true;
        let mut cursor = self.nodes[SENTINEL].next;
        while let Some(id) = cursor {
            if at_row_start {
                starts.push(id);
            }
            at_row_start = self.nodes[id].end_of_line;
            cursor = self.nodes[id].next;
        }
        starts
    }

    fn row_ends(&self) -> Vec<NodeId> {
        let mut ends = Vec::with_capacity(self.rows);
        let mut cursor = self.nodes[SENTINEL].next;
        while let Some(id) = cursor {
            if self.nodes[id].end_of_line {
                ends.push(id);
            }
            cursor = self.nodes[id].next;
        }
        assert!(!ends.is_empty(), "grid has no line-end marker");
        ends
    }

    fn alloc(&mut self, fragment: F) -> NodeId {
        let node = Node {
            fragment: Some(fragment),
            ..Node::vacant()
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn insert_after(&mut self, at: NodeId, id: NodeId) {
        let next = self.nodes[at].next;
        self.nodes[id].prev = at;
        self.nodes[id].next = next;
        self.nodes[at].next = Some(id);
        match next {
            Some(next) => self.nodes[next].prev = id,
            None => self.tail = Some(id),
        }
    }

    /// Detaches a node, frees its slot and hands back its fragment
    fn unlink(&mut self, id: NodeId) -> F {
        assert_ne!(id, SENTINEL, "the sentinel cannot be unlinked");
        let prev = self.nodes[id].prev;
        let next = self.nodes[id].next;
        self.nodes[prev].next = next;
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = (prev != SENTINEL).then_some(prev),
        }

        let node = std::mem::replace(&mut self.nodes[id], Node::vacant());
        self.free.push(id);
        match node.fragment {
            Some(fragment) => fragment,
            None => panic!("grid node {id} holds no fragment"),
        }
    }
}

impl<F: Fragment> Default for FragmentGrid<F> {
    fn default() -> Self {
        Self::new()
    }
}
