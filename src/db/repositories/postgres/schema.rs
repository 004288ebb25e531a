// Diesel table definitions for the enrollment schema.

diesel::table! {
    estudiante (id_estudiante) {
        id_estudiante -> Int8,
        nombre -> Text,
        apellido -> Text,
    }
}

diesel::table! {
    usuario (id_usuario) {
        id_usuario -> Int8,
        nombre -> Text,
        email -> Text,
    }
}

diesel::table! {
    materia (id_materia) {
        id_materia -> Int8,
        nombre -> Text,
    }
}

diesel::table! {
    aula (id_aula) {
        id_aula -> Int8,
        nombre_aula -> Text,
        capacidad -> Int4,
        tipo_aula -> Text,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    horario (id_horario) {
        id_horario -> Int8,
        dia -> Text,
        hora_inicio -> Text,
        hora_salida -> Text,
        horas_diarias -> Float8,
        modalidad -> Text,
        aula -> Nullable<Int8>,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    programacion (id_programacion) {
        id_programacion -> Int8,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    programacion_horario (programacion_id, horario_id) {
        programacion_id -> Int8,
        horario_id -> Int8,
    }
}

diesel::table! {
    matricula (id_matricula) {
        id_matricula -> Int8,
        fecha -> Date,
        fecha_inicio -> Date,
        fecha_final -> Date,
        turno -> Text,
        cantidad -> Float8,
        precio -> Float8,
        valor_horas -> Float8,
        valor_materiales -> Nullable<Float8>,
        con_iva -> Bool,
        valor_total -> Float8,
        observaciones -> Text,
        is_active -> Bool,
        alumno -> Int8,
        profesor -> Int8,
        programacion_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    matricula_materia (matricula_id, materia_id) {
        matricula_id -> Int8,
        materia_id -> Int8,
    }
}

diesel::joinable!(horario -> aula (aula));
diesel::joinable!(matricula -> estudiante (alumno));
diesel::joinable!(matricula -> usuario (profesor));
diesel::joinable!(matricula -> programacion (programacion_id));
diesel::joinable!(matricula_materia -> matricula (matricula_id));
diesel::joinable!(matricula_materia -> materia (materia_id));
diesel::joinable!(programacion_horario -> programacion (programacion_id));
diesel::joinable!(programacion_horario -> horario (horario_id));

diesel::allow_tables_to_appear_in_same_query!(
    aula,
    estudiante,
    horario,
    materia,
    matricula,
    matricula_materia,
    programacion,
    programacion_horario,
    usuario,
);
