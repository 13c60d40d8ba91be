use crate::grid::linked::{Node, NodeId};

/// One visited grid cell
#[derive(Debug)]
pub struct GridCell<'a, F> {
    pub fragment: &'a F,
    /// Last cell of its row
    pub end_of_line: bool,
}

/// Row-major walk over a [`FragmentGrid`](crate::grid::FragmentGrid)
pub struct GridIter<'a, F> {
    nodes: &'a [Node<F>],
    cursor: Option<NodeId>,
}

impl<'a, F> GridIter<'a, F> {
    pub(crate) fn new(nodes: &'a [Node<F>], start: Option<NodeId>) -> Self {
        Self { nodes, cursor: start }
    }
}

impl<'a, F> Iterator for GridIter<'a, F> {
    type Item = GridCell<'a, F>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = &self.nodes[id];
        self.cursor = node.next;
        node.fragment.as_ref().map(|fragment| GridCell {
            fragment,
            end_of_line: node.end_of_line,
        })
    }
}

/// Cell of a walk together with its row and column
#[derive(Debug)]
pub struct PositionedCell<'a, F> {
    pub fragment: &'a F,
    pub row: usize,
    pub col: usize,
}

/// Adds row/column tracking to a [`GridIter`], wrapping at line ends
pub struct Positioned<'a, F> {
    inner: GridIter<'a, F>,
    row: usize,
    col: usize,
}

impl<'a, F> GridIter<'a, F> {
    pub fn positioned(self) -> Positioned<'a, F> {
        Positioned {
            inner: self,
            row: 0,
            col: 0,
        }
    }
}

impl<'a, F> Iterator for Positioned<'a, F> {
    type Item = PositionedCell<'a, F>;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.inner.next()?;
        let positioned = PositionedCell {
            fragment: cell.fragment,
            row: self.row,
            col: self.col,
        };
        if cell.end_of_line {
            self.row += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(positioned)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::geo::FragmentCoord;
    use crate::grid::linked::tests::LedgerProvider;
    use crate::grid::{FragmentGrid, GridEdge};

    #[test]
    fn test_positions_wrap_at_line_end() {
        let mut grid = FragmentGrid::new();
        let mut provider = LedgerProvider::default();
        grid.init(FragmentCoord::new(-512, -512), &mut provider);
        grid.add_column(GridEdge::End, &mut provider);
        grid.add_column(GridEdge::End, &mut provider);
        grid.add_row(GridEdge::End, &mut provider);

        let cells: Vec<_> = grid
            .iter()
            .positioned()
            .map(|cell| (cell.row, cell.col, cell.fragment.0))
            .collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (0, 0, FragmentCoord::new(-512, -512)));
        assert_eq!(cells[2], (0, 2, FragmentCoord::new(512, -512)));
        assert_eq!(cells[3], (1, 0, FragmentCoord::new(-512, 0)));
        assert_eq!(cells[5], (1, 2, FragmentCoord::new(512, 0)));
    }
}
