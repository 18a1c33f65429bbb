//! Diesel schema for task graph persistence.

diesel::table! {
    /// Operation header rows.
    operations (id) {
        /// Operation identifier.
        #[max_length = 64]
        id -> Varchar,
        /// Display name.
        name -> Text,
    }
}

diesel::table! {
    /// Teams an operation is shared with.
    operation_teams (op_id, team_id) {
        /// Insertion sequence.
        seq -> Int8,
        /// Owning operation.
        #[max_length = 64]
        op_id -> Varchar,
        /// Team identifier.
        #[max_length = 64]
        team_id -> Varchar,
    }
}

diesel::table! {
    /// Task rows (markers and links).
    tasks (op_id, id) {
        /// Insertion sequence.
        seq -> Int8,
        /// Owning operation.
        #[max_length = 64]
        op_id -> Varchar,
        /// Task identifier, unique within the operation.
        #[max_length = 64]
        id -> Varchar,
        /// `marker` or `link`.
        #[max_length = 16]
        kind -> Varchar,
        /// Lifecycle state.
        #[max_length = 16]
        state -> Varchar,
        /// Sequence order within the operation.
        task_order -> Int2,
        /// Zone number.
        zone -> Int2,
        /// Minutes relative to operation start.
        delta_minutes -> Int4,
        /// Free-form comment.
        comment -> Nullable<Text>,
    }
}

diesel::table! {
    /// Dependency edges: `task_id` should follow `depends_on`.
    depends (seq) {
        /// Insertion sequence.
        seq -> Int8,
        /// Owning operation.
        #[max_length = 64]
        op_id -> Varchar,
        /// Dependent task.
        #[max_length = 64]
        task_id -> Varchar,
        /// Task that must come first.
        #[max_length = 64]
        depends_on -> Varchar,
    }
}

diesel::table! {
    /// Agent assignments.
    assignments (seq) {
        /// Insertion sequence.
        seq -> Int8,
        /// Owning operation.
        #[max_length = 64]
        op_id -> Varchar,
        /// Assigned task.
        #[max_length = 64]
        task_id -> Varchar,
        /// Assigned agent.
        #[max_length = 64]
        agent_id -> Varchar,
    }
}
