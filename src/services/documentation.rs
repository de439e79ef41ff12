use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the trivia board backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::board::get_board,
        crate::routes::board::save_board,
        crate::routes::board::rename_board,
        crate::routes::board::resize_board,
        crate::routes::board::set_category,
        crate::routes::board::set_cell,
        crate::routes::board::mark_played,
        crate::routes::board::enter_play,
        crate::routes::board::enter_author,
        crate::routes::board::reset_progress,
        crate::routes::board::list_boards,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::board::BoardSummary,
            crate::dto::board::CellSummary,
            crate::dto::board::ModeDto,
            crate::dto::board::SaveBoardResponse,
            crate::dto::board::RenameBoardRequest,
            crate::dto::board::ResizeBoardRequest,
            crate::dto::board::CategoryRequest,
            crate::dto::board::CellRequest,
            crate::dto::board::BoardListItem,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "board", description = "Board authoring and play operations"),
    )
)]
pub struct ApiDoc;
