/// Camera Module - Data-Oriented Programming (DOP) style
///
/// - camera_data.rs: Pure data structures with NO methods
/// - camera_operations.rs: Pure functions that operate on data

pub mod camera_data;
pub mod camera_operations;

pub use camera_data::{DisplayCamera, ScreenRect};

pub use camera_operations::{
    // Initialization
    init_camera,
    resize,
    scroll_to,

    // Conversion
    floored_display,
    screen_to_tile,
    screen_to_world,
    scroll_px,
    visible_tiles,
    world_to_screen,
    world_to_tile,

    // Rectangles
    expand_rect,
    rect_contains,
    viewport_rect,

    // Diagnostics
    crossed_tile_boundary,
    log_camera_context,
    movement_tiles,
};
