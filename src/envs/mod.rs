pub mod grid_maze;
