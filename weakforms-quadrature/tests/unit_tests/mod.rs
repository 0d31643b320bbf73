mod univariate;
