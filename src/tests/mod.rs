mod atom;
mod quicktime;
mod avi;
mod colormodels;
