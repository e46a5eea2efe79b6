mod app;
mod data_editor;
mod gateway;
mod object_tabs;
