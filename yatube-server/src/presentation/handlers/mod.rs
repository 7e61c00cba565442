pub mod auth;
pub mod posts;

use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(posts::index)
        .service(posts::group_posts)
        .service(posts::profile)
        .service(posts::post_create_form)
        .service(posts::post_create)
        .service(posts::post_edit_form)
        .service(posts::post_edit)
        .service(posts::add_comment)
        .service(posts::post_detail)
        .service(auth::scope());
}
