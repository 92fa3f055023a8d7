pub mod department_export;
