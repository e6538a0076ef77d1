diesel::table! {
    blogs (id) {
        id -> Uuid,
        title -> Varchar,
        content -> Text,
        author_id -> Uuid,
        category -> Varchar,
        image -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        blog_id -> Uuid,
        user_id -> Uuid,
        body -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    likes (blog_id, user_id) {
        blog_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password -> Varchar,
        is_admin -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(blogs -> users (author_id));
diesel::joinable!(comments -> blogs (blog_id));
diesel::joinable!(likes -> blogs (blog_id));

diesel::allow_tables_to_appear_in_same_query!(blogs, comments, likes, users,);
