// Maintained by hand to match the schema created in `DieselDbContext::init_schema`.

diesel::table! {
    harvested_pdfs (id) {
        id -> Integer,
        url -> Text,
        filename -> Text,
        file_size -> BigInt,
        content_hash -> Text,
        source_feed -> Text,
        harvest_date -> Text,
        status -> Text,
        failure_reason -> Nullable<Text>,
        article_title -> Text,
        article_url -> Text,
    }
}

diesel::table! {
    articles (id) {
        id -> Integer,
        title -> Text,
        theme -> Text,
        link -> Text,
        description -> Text,
        published -> Text,
        last_updated -> Text,
        is_active -> Integer,
    }
}

diesel::allow_tables_to_appear_in_same_query!(harvested_pdfs, articles);
