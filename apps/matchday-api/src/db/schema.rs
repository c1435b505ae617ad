diesel::table! {
    users (id) {
        id -> Text,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        notification_preferences -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    user_matches (user_id, match_id) {
        user_id -> Text,
        match_id -> Text,
        participation_status -> Text,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    friendships (id) {
        id -> Text,
        sender_id -> Text,
        receiver_id -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Text,
        user_id -> Text,
        #[sql_name = "type"]
        type_ -> Text,
        message -> Text,
        is_read -> Bool,
        is_dismissed -> Bool,
        created_at -> Timestamptz,
    }
}
